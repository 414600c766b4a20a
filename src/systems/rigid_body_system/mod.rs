//! RigidBodySystem - `PhysicsEngine` on top of rapier2d
//!
//! Oriented rectangles only, simulated in meters and exposed in pixels.
//! - tiles are dynamic bodies with CCD and no sleeping
//! - walls are kinematic bodies, grouped into composites that turn about a pivot
//! - a queued composite turn is spread over the substeps of the next step,
//!   so no wall point jumps further than half the wall thickness at once
//! - forces accumulate until the end of the next step

mod composite;
mod system;

pub use system::{RigidBodySystem, MAX_SUBSTEP_MS, PIXELS_PER_METER};
