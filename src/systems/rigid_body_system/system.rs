use rapier2d::na::Vector2;
use rapier2d::prelude::{
    BroadPhaseBvh, CCDSolver, CoefficientCombineRule, ColliderBuilder, ColliderSet, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Real,
    RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};

use crate::engine::{BodyDesc, BodyHandle, BodyPose, CompositeHandle, EngineError, PhysicsEngine};
use crate::vec2::Vec2;

use super::composite::{KinematicComposite, Member};

/// Screen pixels per rapier meter.
pub const PIXELS_PER_METER: f32 = 100.0;
/// Longest integration step; longer steps are split.
pub const MAX_SUBSTEP_MS: f32 = 1000.0 / 240.0;
/// Upper bound on substeps per `step`, so a huge delta cannot stall a frame.
const MAX_SUBSTEPS: u32 = 64;

fn to_meters(v: Vec2) -> Vector2<Real> {
    Vector2::new(v.x / PIXELS_PER_METER, v.y / PIXELS_PER_METER)
}

fn to_pixels(v: &Vector2<Real>) -> Vec2 {
    Vec2::new(v.x * PIXELS_PER_METER, v.y * PIXELS_PER_METER)
}

#[derive(Clone, Copy)]
struct BodyEntry {
    handle: RigidBodyHandle,
    half_extents: Vector2<Real>,
}

/// Manages all rigid bodies in the simulation on a rapier2d pipeline.
///
/// Static bodies are kinematic: they never move on their own, but a
/// composite of them can be turned, and contacts with them then carry the
/// wall velocity into the tiles.
pub struct RigidBodySystem {
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector2<Real>,
    entries: Vec<BodyEntry>,
    composites: Vec<KinematicComposite>,
    released: bool,
}

impl RigidBodySystem {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector2::zeros(),
            entries: Vec::new(),
            composites: Vec::new(),
            released: false,
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let entry = self.entries.get(handle.0 as usize)?;
        self.bodies.get(entry.handle)
    }

    fn dynamic_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let entry = self.entries.get(handle.0 as usize)?;
        self.bodies.get_mut(entry.handle).filter(|b| b.is_dynamic())
    }

    fn substep(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

impl Default for RigidBodySystem {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(desc: &BodyDesc) -> Result<(), EngineError> {
    if !(desc.width.is_finite() && desc.width > 0.0 && desc.height.is_finite() && desc.height > 0.0) {
        return Err(EngineError::InvalidBody(format!(
            "size must be positive, got {}x{}",
            desc.width, desc.height
        )));
    }
    if !(desc.density.is_finite() && desc.density > 0.0) {
        return Err(EngineError::InvalidBody(format!("density must be positive, got {}", desc.density)));
    }
    if !desc.position.is_finite() || !desc.angle.is_finite() {
        return Err(EngineError::InvalidBody("position and angle must be finite".to_string()));
    }
    Ok(())
}

impl PhysicsEngine for RigidBodySystem {
    fn set_gravity(&mut self, gravity: Vec2) {
        if gravity.is_finite() {
            self.gravity = to_meters(gravity);
        }
    }

    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, EngineError> {
        if self.released {
            return Err(EngineError::Released);
        }
        validate(desc)?;

        let builder = if desc.is_static {
            RigidBodyBuilder::kinematic_position_based()
        } else {
            // Tiles never sleep: the mixing force and the turning walls must
            // always reach them.
            RigidBodyBuilder::dynamic().can_sleep(false).ccd_enabled(true)
        };
        let handle = self
            .bodies
            .insert(builder.translation(to_meters(desc.position)).rotation(desc.angle).build());

        let half_extents = Vector2::new(desc.width, desc.height) / (2.0 * PIXELS_PER_METER);
        // Combine rules: the bouncier surface wins, the slicker surface wins.
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .restitution(desc.restitution.clamp(0.0, 1.0))
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .friction(desc.friction.max(0.0))
            .friction_combine_rule(CoefficientCombineRule::Min)
            .density(desc.density * PIXELS_PER_METER * PIXELS_PER_METER)
            .build();
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }

        let id = BodyHandle(self.entries.len() as u32);
        self.entries.push(BodyEntry { handle, half_extents });
        Ok(id)
    }

    fn create_composite(&mut self, bodies: &[BodyHandle]) -> Result<CompositeHandle, EngineError> {
        if self.released {
            return Err(EngineError::Released);
        }
        let members = bodies
            .iter()
            .map(|h| {
                self.entries
                    .get(h.0 as usize)
                    .filter(|entry| self.bodies.get(entry.handle).is_some_and(|b| b.is_kinematic()))
                    .map(|entry| Member {
                        handle: entry.handle,
                        half_extents: entry.half_extents,
                    })
                    .ok_or(EngineError::UnknownBody(*h))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let handle = CompositeHandle(self.composites.len() as u32);
        self.composites.push(KinematicComposite::new(members));
        Ok(handle)
    }

    fn rotate_composite(&mut self, composite: CompositeHandle, delta: f32, pivot: Vec2) {
        if !delta.is_finite() || !pivot.is_finite() {
            return;
        }
        if let Some(c) = self.composites.get_mut(composite.0 as usize) {
            c.queue_rotation(delta, to_meters(pivot), &self.bodies);
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if !velocity.is_finite() {
            return;
        }
        if let Some(b) = self.dynamic_body_mut(body) {
            b.set_linvel(to_meters(velocity), true);
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: f32) {
        if !angular_velocity.is_finite() {
            return;
        }
        if let Some(b) = self.dynamic_body_mut(body) {
            b.set_angvel(angular_velocity, true);
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.body(body).map(|b| to_pixels(b.linvel()))
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<f32> {
        self.body(body).map(|b| b.angvel())
    }

    fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.body(body).map(|b| b.mass())
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) {
        if !force.is_finite() {
            return;
        }
        if let Some(b) = self.dynamic_body_mut(body) {
            b.add_force(to_meters(force), true);
        }
    }

    fn step(&mut self, dt_ms: f32) {
        if self.released || !(dt_ms.is_finite() && dt_ms > 0.0) {
            return;
        }
        let sweep = self.composites.iter().map(KinematicComposite::substeps_needed).max().unwrap_or(1);
        let substeps = ((dt_ms / MAX_SUBSTEP_MS).ceil() as u32).max(sweep).clamp(1, MAX_SUBSTEPS);
        self.params.dt = dt_ms / 1000.0 / substeps as f32;

        for _ in 0..substeps {
            for composite in &self.composites {
                composite.advance(substeps, &mut self.bodies);
            }
            self.substep();
        }

        for composite in &mut self.composites {
            composite.finish();
        }
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }
    }

    fn pose(&self, body: BodyHandle) -> Option<BodyPose> {
        self.body(body).map(|b| BodyPose {
            position: to_pixels(b.translation()),
            angle: b.rotation().angle(),
        })
    }

    fn release(&mut self) {
        self.bodies = RigidBodySet::new();
        self.colliders = ColliderSet::new();
        self.islands = IslandManager::new();
        self.broad_phase = BroadPhaseBvh::new();
        self.narrow_phase = NarrowPhase::new();
        self.impulse_joints = ImpulseJointSet::new();
        self.multibody_joints = MultibodyJointSet::new();
        self.ccd_solver = CCDSolver::new();
        self.entries.clear();
        self.composites.clear();
        self.released = true;
    }

    fn body_count(&self) -> usize {
        self.entries.len()
    }
}
