use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::*;
use crate::domain::color::Rgb;
use crate::domain::settings::SimulationSettings;
use crate::domain::tiles::TileSpec;
use crate::engine::{BodyDesc, BodyHandle, BodyPose, CompositeHandle, EngineError, PhysicsEngine};
use crate::vec2::Vec2;

#[derive(Debug, Default)]
struct MockLog {
    released: bool,
    steps: Vec<f32>,
    rotations: Vec<f32>,
    created: usize,
}

#[derive(Debug)]
struct MockBody {
    desc: BodyDesc,
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
}

/// Records commands; `step` integrates forces and velocities without contacts.
#[derive(Debug)]
struct MockEngine {
    bodies: Vec<MockBody>,
    composites: Vec<Vec<BodyHandle>>,
    log: Rc<RefCell<MockLog>>,
    fail_after: Option<usize>,
}

impl MockEngine {
    fn new() -> (Self, Rc<RefCell<MockLog>>) {
        let log = Rc::new(RefCell::new(MockLog::default()));
        let engine = Self {
            bodies: Vec::new(),
            composites: Vec::new(),
            log: log.clone(),
            fail_after: None,
        };
        (engine, log)
    }

    fn failing_after(count: usize) -> (Self, Rc<RefCell<MockLog>>) {
        let (mut engine, log) = Self::new();
        engine.fail_after = Some(count);
        (engine, log)
    }

    fn get(&self, handle: BodyHandle) -> Option<&MockBody> {
        self.bodies.get(handle.0 as usize)
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut MockBody> {
        self.bodies.get_mut(handle.0 as usize)
    }

    fn force(&self, handle: BodyHandle) -> Vec2 {
        self.get(handle).map_or(Vec2::zero(), |b| b.force)
    }
}

impl PhysicsEngine for MockEngine {
    fn set_gravity(&mut self, _gravity: Vec2) {}

    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, EngineError> {
        if self.log.borrow().released {
            return Err(EngineError::Released);
        }
        if self.fail_after.is_some_and(|limit| self.bodies.len() >= limit) {
            return Err(EngineError::InvalidBody("mock limit".to_string()));
        }
        self.bodies.push(MockBody {
            desc: *desc,
            position: desc.position,
            angle: desc.angle,
            velocity: Vec2::zero(),
            angular_velocity: 0.0,
            force: Vec2::zero(),
        });
        self.log.borrow_mut().created += 1;
        Ok(BodyHandle(self.bodies.len() as u32 - 1))
    }

    fn create_composite(&mut self, bodies: &[BodyHandle]) -> Result<CompositeHandle, EngineError> {
        self.composites.push(bodies.to_vec());
        Ok(CompositeHandle(self.composites.len() as u32 - 1))
    }

    fn rotate_composite(&mut self, composite: CompositeHandle, delta: f32, pivot: Vec2) {
        self.log.borrow_mut().rotations.push(delta);
        let members = self.composites.get(composite.0 as usize).cloned().unwrap_or_default();
        for handle in members {
            if let Some(body) = self.get_mut(handle) {
                body.position = body.position.rotate_about(pivot, delta);
                body.angle += delta;
            }
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: f32) {
        if let Some(b) = self.get_mut(body) {
            b.angular_velocity = angular_velocity;
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.get(body).map(|b| b.velocity)
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<f32> {
        self.get(body).map(|b| b.angular_velocity)
    }

    fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.get(body).map(|b| b.desc.density * b.desc.width * b.desc.height)
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.force += force;
        }
    }

    fn step(&mut self, dt_ms: f32) {
        self.log.borrow_mut().steps.push(dt_ms);
        let h = dt_ms / 1000.0;
        for b in self.bodies.iter_mut().filter(|b| !b.desc.is_static) {
            let mass = b.desc.density * b.desc.width * b.desc.height;
            b.velocity += b.force * (h / mass);
            b.position += b.velocity * h;
            b.angle += b.angular_velocity * h;
            b.force = Vec2::zero();
        }
    }

    fn pose(&self, body: BodyHandle) -> Option<BodyPose> {
        self.get(body).map(|b| BodyPose {
            position: b.position,
            angle: b.angle,
        })
    }

    fn release(&mut self) {
        self.bodies.clear();
        self.composites.clear();
        self.log.borrow_mut().released = true;
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DrawCall {
    Clear(f64, f64),
    Fill(Rgb),
    Tile(TileSpec, TilePlacement),
    Outline(Outline),
}

#[derive(Default)]
struct RecordingSurface {
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    fn tiles(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Tile(..))).count()
    }

    fn last_outline(&self) -> Option<&Outline> {
        self.calls.iter().rev().find_map(|c| match c {
            DrawCall::Outline(o) => Some(o),
            _ => None,
        })
    }
}

impl DrawingSurface for RecordingSurface {
    type Image = ();

    fn clear(&mut self, width: f64, height: f64) -> Result<(), SurfaceError> {
        self.calls.push(DrawCall::Clear(width, height));
        Ok(())
    }

    fn fill(&mut self, color: Rgb, _width: f64, _height: f64) -> Result<(), SurfaceError> {
        self.calls.push(DrawCall::Fill(color));
        Ok(())
    }

    fn draw_image_region(&mut self, _image: &(), source: &TileSpec, placement: TilePlacement) -> Result<(), SurfaceError> {
        self.calls.push(DrawCall::Tile(*source, placement));
        Ok(())
    }

    fn stroke_rotated_rect(&mut self, outline: &Outline) -> Result<(), SurfaceError> {
        self.calls.push(DrawCall::Outline(*outline));
        Ok(())
    }
}

/// No jitter, no initial motion: tiles sit exactly on their image cells.
fn still_settings() -> SimulationSettings {
    SimulationSettings {
        position_jitter: 0.0,
        initial_speed_max: 0.0,
        initial_angular_speed_max: 0.0,
        ..SimulationSettings::default()
    }
}

fn build_world(settings: &SimulationSettings, width: u32, height: u32) -> (PhysicsWorld<MockEngine>, Rc<RefCell<MockLog>>) {
    let (engine, log) = MockEngine::new();
    let mut rng = SmallRng::seed_from_u64(42);
    let world = WorldBuilder::new(settings)
        .build(engine, width, height, &mut rng)
        .expect("world should build");
    (world, log)
}

fn loaded_loop(settings: SimulationSettings) -> (RenderLoop<MockEngine, ()>, SharedDragState, Rc<RefCell<MockLog>>) {
    let drag = SharedDragState::new();
    let mut render = RenderLoop::new(settings, drag.clone()).expect("valid settings");
    let (engine, log) = MockEngine::new();
    let mut rng = SmallRng::seed_from_u64(1);
    render
        .load_capture(Capture { image: (), width: 320, height: 200 }, engine, &mut rng)
        .expect("world should build");
    (render, drag, log)
}

// === World building ===

#[test]
fn builder_makes_square_container_with_one_body_per_tile() {
    let settings = SimulationSettings::default();
    let (world, log) = build_world(&settings, 800, 600);

    let container = world.container();
    assert_eq!(container.width(), container.height());
    assert_eq!(container.side(), 800.0 + 2.0 * settings.container_padding);
    assert_eq!(world.tile_count() as u32, world.grid().count());
    assert_eq!(world.engine().body_count(), world.tile_count() + 4);
    assert_eq!(log.borrow().created, world.tile_count() + 4);

    for tile in world.tiles() {
        let v = world.engine().velocity(tile.body).unwrap();
        assert!(v.x.abs() <= settings.initial_speed_max && v.y.abs() <= settings.initial_speed_max);
        let w = world.engine().angular_velocity(tile.body).unwrap();
        assert!(w.abs() <= settings.initial_angular_speed_max);
    }
}

#[test]
fn tiles_start_on_their_cells_within_jitter() {
    let settings = SimulationSettings::default();
    let (world, _) = build_world(&settings, 640, 480);
    let offset = world.image_offset();
    assert_eq!(offset, Vec2::new(40.0, 120.0));

    for (i, tile) in world.tiles().iter().enumerate() {
        let pose = world.tile_pose(i).unwrap();
        let (cx, cy) = tile.spec.source_center();
        let cell = offset + Vec2::new(cx, cy);
        assert!((pose.position.x - cell.x).abs() <= settings.position_jitter);
        assert!((pose.position.y - cell.y).abs() <= settings.position_jitter);
    }
}

#[test]
fn same_seed_reproduces_the_same_world() {
    let settings = SimulationSettings::default();
    let (a, _) = build_world(&settings, 500, 500);
    let (b, _) = build_world(&settings, 500, 500);
    for i in 0..a.tile_count() {
        assert_eq!(a.tile_pose(i), b.tile_pose(i));
        let body_a = a.tiles()[i].body;
        let body_b = b.tiles()[i].body;
        assert_eq!(a.engine().velocity(body_a), b.engine().velocity(body_b));
    }
}

#[test]
fn degenerate_image_is_refused_before_touching_the_engine() {
    let settings = SimulationSettings::default();
    let (engine, log) = MockEngine::new();
    let mut rng = SmallRng::seed_from_u64(3);
    let err = WorldBuilder::new(&settings).build(engine, 0, 300, &mut rng).unwrap_err();
    assert_eq!(err, BuildError::DegenerateImage { width: 0, height: 300 });
    assert_eq!(log.borrow().created, 0);
}

#[test]
fn engine_failure_mid_build_releases_partial_world() {
    let settings = SimulationSettings::default();
    let (engine, log) = MockEngine::failing_after(10);
    let mut rng = SmallRng::seed_from_u64(3);
    let err = WorldBuilder::new(&settings).build(engine, 400, 300, &mut rng).unwrap_err();
    assert!(matches!(err, BuildError::Engine(EngineError::InvalidBody(_))));
    assert!(log.borrow().released);
}

#[test]
fn invalid_settings_are_reported_as_build_errors() {
    let settings = SimulationSettings {
        max_speed: -1.0,
        ..SimulationSettings::default()
    };
    let (engine, _) = MockEngine::new();
    let mut rng = SmallRng::seed_from_u64(3);
    let err = WorldBuilder::new(&settings).build(engine, 400, 300, &mut rng).unwrap_err();
    assert!(matches!(err, BuildError::InvalidSettings(_)));
}

#[test]
fn dropping_the_world_releases_the_engine() {
    let (world, log) = build_world(&SimulationSettings::default(), 200, 200);
    assert!(!log.borrow().released);
    drop(world);
    assert!(log.borrow().released);
}

// === Mixing ===

#[test]
fn mixing_below_epsilon_leaves_tiles_alone() {
    let settings = SimulationSettings::default();
    let (mut world, _) = build_world(&settings, 300, 300);
    let before: Vec<_> = world.tiles().iter().map(|t| world.engine().velocity(t.body)).collect();

    let model = MixingForceModel::from_settings(&settings);
    assert_eq!(model.apply(&mut world, 0.0), 0);
    assert_eq!(model.apply(&mut world, settings.mixing_epsilon * 0.5), 0);
    world.step(16.0);

    let after: Vec<_> = world.tiles().iter().map(|t| world.engine().velocity(t.body)).collect();
    assert_eq!(before, after);
}

#[test]
fn mixing_pushes_along_tangent_scaled_by_radius() {
    let settings = still_settings();
    let (mut world, _) = build_world(&settings, 400, 400);
    let model = MixingForceModel::from_settings(&settings);
    let delta = 0.05_f32;

    let pushed = model.apply(&mut world, delta);
    assert!(pushed > 0 && pushed <= world.tile_count());

    let center = world.container().center();
    let half_side = world.container().side() / 2.0;
    for tile in world.tiles() {
        let offset = world.engine().pose(tile.body).unwrap().position - center;
        let Some(tangent) = MixingForceModel::tangent(offset) else {
            continue;
        };
        let mass = world.engine().mass(tile.body).unwrap();
        let expected = tangent * (delta * model.strength * model.radius_factor(offset.length(), half_side) * mass);
        let force = world.engine().force(tile.body);
        assert!((force - expected).length() <= expected.length() * 1e-4 + 1e-6);
        // Perpendicular to the radius, turning (dx, dy) towards (dy, -dx).
        assert!(force.dot(offset).abs() <= force.length() * offset.length() * 1e-4);
        assert!(offset.cross(force) <= 0.0);
    }
}

#[test]
fn rim_tiles_get_more_force_per_mass_than_inner_tiles() {
    let settings = still_settings();
    let (mut world, _) = build_world(&settings, 400, 400);
    let model = MixingForceModel::from_settings(&settings);
    model.apply(&mut world, 0.1);

    let center = world.container().center();
    let accel = |tile: &TileBody| {
        let engine = world.engine();
        let r = (engine.pose(tile.body).unwrap().position - center).length();
        (r, engine.force(tile.body).length() / engine.mass(tile.body).unwrap())
    };
    let mut samples: Vec<(f32, f32)> = world.tiles().iter().map(accel).collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    let inner = samples.first().unwrap();
    let outer = samples.last().unwrap();
    assert!(outer.1 > inner.1);
}

// === Governor ===

#[test]
fn governor_clamps_fast_tiles_and_leaves_slow_ones() {
    let settings = still_settings();
    let (mut world, _) = build_world(&settings, 300, 300);
    let fast = world.tiles()[0].body;
    let slow = world.tiles()[1].body;
    world.engine_mut().set_velocity(fast, Vec2::new(3000.0, -4000.0));
    world.engine_mut().set_angular_velocity(fast, -40.0);
    world.engine_mut().set_velocity(slow, Vec2::new(10.0, 20.0));
    world.engine_mut().set_angular_velocity(slow, 1.0);

    let governor = VelocityGovernor::from_settings(&settings);
    assert_eq!(governor.govern(&mut world), 1);

    let v = world.engine().velocity(fast).unwrap();
    assert!((v.length() - settings.max_speed).abs() < 1e-2);
    assert!((v.x / v.y - 3000.0 / -4000.0).abs() < 1e-4);
    assert_eq!(world.engine().angular_velocity(fast), Some(-settings.max_angular_speed));

    assert_eq!(world.engine().velocity(slow), Some(Vec2::new(10.0, 20.0)));
    assert_eq!(world.engine().angular_velocity(slow), Some(1.0));
}

#[test]
fn governor_zeroes_non_finite_motion() {
    let settings = still_settings();
    let (mut world, _) = build_world(&settings, 300, 300);
    let broken = world.tiles()[0].body;
    world.engine_mut().set_velocity(broken, Vec2::new(f32::NAN, f32::INFINITY));
    world.engine_mut().set_angular_velocity(broken, f32::NAN);

    let governor = VelocityGovernor::from_settings(&settings);
    assert_eq!(governor.govern(&mut world), 1);
    assert_eq!(world.engine().velocity(broken), Some(Vec2::zero()));
    assert_eq!(world.engine().angular_velocity(broken), Some(0.0));
}

// === Render loop ===

#[test]
fn render_loop_is_idle_without_a_world() {
    let drag = SharedDragState::new();
    let mut render: RenderLoop<MockEngine, ()> = RenderLoop::new(SimulationSettings::default(), drag).unwrap();
    let mut surface = RecordingSurface::default();

    assert_eq!(render.tick(16.0, &mut surface), FrameOutcome::Idle);
    assert_eq!(render.frame(1000.0, &mut surface), FrameOutcome::Idle);
    assert!(surface.calls.is_empty());
    assert_eq!(render.stats().frames, 0);
}

#[test]
fn first_frame_seeds_previous_angle() {
    let (mut render, drag, log) = loaded_loop(SimulationSettings::default());
    drag.update(|s| s.container_angle = 5.0);
    let mut surface = RecordingSurface::default();

    let first = render.tick(16.0, &mut surface);
    assert_eq!(first, FrameOutcome::Rendered { tiles_drawn: render.world().unwrap().tile_count(), delta: 0.0 });
    assert!(log.borrow().rotations.is_empty());

    drag.update(|s| s.container_angle = 5.2);
    match render.tick(16.0, &mut surface) {
        FrameOutcome::Rendered { delta, .. } => assert!((delta - 0.2).abs() < 1e-9),
        other => panic!("unexpected outcome {:?}", other),
    }
    let rotations = log.borrow().rotations.clone();
    assert_eq!(rotations.len(), 1);
    assert!((rotations[0] - 0.2).abs() < 1e-6);
    assert!((render.stats().last_delta - 0.2).abs() < 1e-9);
}

#[test]
fn frame_delta_is_wrapped_but_outline_uses_cumulative_angle() {
    let (mut render, drag, _) = loaded_loop(SimulationSettings::default());
    let mut surface = RecordingSurface::default();
    render.tick(16.0, &mut surface);

    let jump = std::f64::consts::TAU + 0.1;
    drag.update(|s| s.container_angle += jump);
    match render.tick(16.0, &mut surface) {
        FrameOutcome::Rendered { delta, .. } => assert!((delta - 0.1).abs() < 1e-9),
        other => panic!("unexpected outcome {:?}", other),
    }
    let outline = surface.last_outline().unwrap();
    assert!((outline.angle - jump).abs() < 1e-9);
}

#[test]
fn elapsed_time_is_clamped_before_stepping() {
    let settings = SimulationSettings::default();
    let max = settings.max_frame_step_ms;
    let (mut render, _, log) = loaded_loop(settings);
    let mut surface = RecordingSurface::default();

    render.tick(5_000.0, &mut surface);
    render.tick(10.0, &mut surface);
    render.tick(f64::NAN, &mut surface);

    assert_eq!(log.borrow().steps, vec![max, 10.0, 0.0]);
}

#[test]
fn frame_timestamps_drive_the_clock() {
    let (mut render, _, log) = loaded_loop(SimulationSettings::default());
    let mut surface = RecordingSurface::default();

    render.frame(10_000.0, &mut surface);
    render.frame(10_020.0, &mut surface);

    let steps = log.borrow().steps.clone();
    assert!((steps[0] as f64 - FIRST_FRAME_MS).abs() < 1e-4);
    assert_eq!(steps[1], 20.0);
}

#[test]
fn each_frame_draws_every_tile_then_the_outline() {
    let (mut render, drag, _) = loaded_loop(SimulationSettings::default());
    drag.update(|s| s.container_angle = -1.25);
    let mut surface = RecordingSurface::default();
    render.tick(16.0, &mut surface);

    let tile_count = render.world().unwrap().tile_count();
    let side = render.container_side().unwrap() as f64;
    assert_eq!(surface.calls.first(), Some(&DrawCall::Clear(side, side)));
    assert_eq!(surface.tiles(), tile_count);
    assert!(matches!(surface.calls.last(), Some(DrawCall::Outline(_))));

    let outline = surface.last_outline().unwrap();
    assert_eq!(outline.angle, -1.25);
    assert_eq!(outline.width, side);
    assert_eq!(outline.color, Rgb::new(255, 255, 255));

    let stats = render.stats();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.tile_count as usize, tile_count);
}

#[test]
fn teardown_releases_world_and_stops_frames() {
    let (mut render, drag, log) = loaded_loop(SimulationSettings::default());
    let generation = render.generation();
    render.teardown();

    assert!(log.borrow().released);
    assert!(!render.is_running());
    assert!(render.generation() > generation);

    drag.update(|s| s.container_angle = 3.0);
    let mut surface = RecordingSurface::default();
    assert_eq!(render.tick(16.0, &mut surface), FrameOutcome::Stopped);
    assert!(surface.calls.is_empty());
    assert!(log.borrow().steps.is_empty());
}

#[test]
fn loading_a_new_capture_releases_the_previous_world() {
    let (mut render, _, first_log) = loaded_loop(SimulationSettings::default());
    let generation = render.generation();

    let (engine, second_log) = MockEngine::new();
    let mut rng = SmallRng::seed_from_u64(9);
    render
        .load_capture(Capture { image: (), width: 100, height: 400 }, engine, &mut rng)
        .unwrap();

    assert!(first_log.borrow().released);
    assert!(!second_log.borrow().released);
    assert!(render.generation() > generation);
    assert_eq!(render.container_side(), Some(480.0));
}

#[test]
fn failed_build_leaves_loop_idle() {
    let (mut render, _, _) = loaded_loop(SimulationSettings::default());
    let (engine, log) = MockEngine::failing_after(2);
    let mut rng = SmallRng::seed_from_u64(9);
    let result = render.load_capture(Capture { image: (), width: 100, height: 100 }, engine, &mut rng);

    assert!(result.is_err());
    assert!(log.borrow().released);
    assert!(!render.has_world());
    let mut surface = RecordingSurface::default();
    assert_eq!(render.tick(16.0, &mut surface), FrameOutcome::Idle);
}

#[test]
fn decode_failure_paints_fallback_and_drops_world() {
    let (mut render, _, log) = loaded_loop(SimulationSettings::default());
    let mut surface = RecordingSurface::default();
    render.capture_failed(&mut surface, 320.0, 200.0).unwrap();

    assert_eq!(surface.calls, vec![DrawCall::Fill(Rgb::new(0x33, 0x33, 0x33))]);
    assert!(log.borrow().released);
    assert_eq!(render.tick(16.0, &mut surface), FrameOutcome::Idle);
}

#[test]
fn settings_update_changes_governor_without_rebuild() {
    let (mut render, _, _) = loaded_loop(still_settings());
    let tighter = SimulationSettings {
        max_speed: 5.0,
        ..still_settings()
    };
    render.set_settings(tighter).unwrap();
    assert_eq!(render.settings().max_speed, 5.0);

    let bad = SimulationSettings {
        outline_color: "nope".to_string(),
        ..still_settings()
    };
    assert!(render.set_settings(bad).is_err());
    assert_eq!(render.settings().max_speed, 5.0);
}

#[test]
fn drag_and_render_share_one_cell() {
    let (mut render, drag, log) = loaded_loop(SimulationSettings::default());
    let mut controller = RotationController::new(drag.clone());
    let knob = ControlBounds {
        left: 0.0,
        top: 0.0,
        width: 100.0,
        height: 100.0,
    };
    let mut surface = RecordingSurface::default();
    render.tick(16.0, &mut surface);

    controller.drag_start(PointerSample::new(100.0, 50.0), &knob);
    controller.drag_move(PointerSample::new(50.0, 100.0), &knob);
    assert!(render.drag_state().snapshot().is_dragging);

    render.tick(16.0, &mut surface);
    let rotations = log.borrow().rotations.clone();
    assert_eq!(rotations.len(), 1);
    assert!((rotations[0] - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
}
