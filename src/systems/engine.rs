//! PhysicsEngine - the narrow capability surface the simulation drives
//!
//! The tile simulation only creates bodies, nudges their velocities, applies
//! forces, steps the world and reads poses back. Anything that provides these
//! operations can stand in for the rapier-backed `RigidBodySystem`, including
//! test doubles.
//!
//! Units: pixels, px/s, rad/s; `step` takes milliseconds.

use std::fmt;

use crate::vec2::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompositeHandle(pub u32);

/// Rectangle body description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDesc {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub is_static: bool,
}

impl BodyDesc {
    pub fn dynamic(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            position,
            width,
            height,
            angle: 0.0,
            restitution: 0.0,
            friction: 0.0,
            density: 0.001,
            is_static: false,
        }
    }

    pub fn fixed(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            is_static: true,
            ..Self::dynamic(position, width, height)
        }
    }

    pub fn with_material(mut self, restitution: f32, friction: f32, density: f32) -> Self {
        self.restitution = restitution;
        self.friction = friction;
        self.density = density;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyPose {
    pub position: Vec2,
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    InvalidBody(String),
    UnknownBody(BodyHandle),
    /// The engine was released; nothing can be created any more.
    Released,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidBody(msg) => write!(f, "Invalid body: {}", msg),
            EngineError::UnknownBody(handle) => write!(f, "Unknown body handle {}", handle.0),
            EngineError::Released => write!(f, "Physics engine has been released"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Operations on stale handles are ignored (setters) or return `None` (queries).
pub trait PhysicsEngine {
    fn set_gravity(&mut self, gravity: Vec2);

    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, EngineError>;

    /// Groups static bodies so they can be rotated as one.
    fn create_composite(&mut self, bodies: &[BodyHandle]) -> Result<CompositeHandle, EngineError>;

    /// Rotates every member about `pivot` by `delta` radians.
    ///
    /// The turn lands during the next `step`. Members sweep through it, so
    /// bodies in their way are pushed rather than left behind.
    fn rotate_composite(&mut self, composite: CompositeHandle, delta: f32, pivot: Vec2);

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);

    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: f32);

    fn velocity(&self, body: BodyHandle) -> Option<Vec2>;

    fn angular_velocity(&self, body: BodyHandle) -> Option<f32>;

    fn mass(&self, body: BodyHandle) -> Option<f32>;

    /// Force at the body's center of mass, consumed by the next `step`.
    fn apply_force(&mut self, body: BodyHandle, force: Vec2);

    fn step(&mut self, dt_ms: f32);

    fn pose(&self, body: BodyHandle) -> Option<BodyPose>;

    /// Drops every body and composite.
    fn release(&mut self);

    fn body_count(&self) -> usize;
}
