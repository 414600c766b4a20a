//! Physics: the capability trait the simulation drives and the rapier-backed
//! engine that implements it.

pub mod engine;
pub mod rigid_body_system;
pub mod vec2;
