//! Tile mixing simulation
//!
//! Builds a square container and one rigid body per image tile, then runs the
//! per-frame pipeline:
//! - rotate the container by the knob delta since the last frame
//! - push tiles along their orbit tangent (mixing force)
//! - step the engine by the clamped frame time
//! - clamp tile speed and spin (governor)
//! - draw every tile at its body pose, then the rotated container outline
//!
//! The engine is reached only through `PhysicsEngine`, and drawing only
//! through `DrawingSurface`, so everything up to the canvas runs natively.

#[path = "init/container.rs"]
mod container;
#[path = "init/builder.rs"]
mod builder;
mod world;
#[path = "input/drag.rs"]
mod drag;
#[path = "step/mixing.rs"]
mod mixing;
#[path = "step/governor.rs"]
mod governor;
#[path = "step/frame_clock.rs"]
mod frame_clock;
#[path = "render/surface.rs"]
mod surface;
#[path = "render/draw.rs"]
mod draw;
#[path = "render/canvas.rs"]
mod canvas;
#[path = "render/scheduler.rs"]
mod scheduler;
#[path = "perf/perf_timer.rs"]
mod perf_timer;
#[path = "perf/frame_stats.rs"]
mod frame_stats;
mod render_loop;
mod facade;

pub use builder::{BuildError, WorldBuilder};
pub use canvas::CanvasSurface;
pub use container::ContainerFrame;
pub use drag::{normalize_angle_delta, ControlBounds, DragState, PointerSample, RotationController, SharedDragState};
pub use facade::{normalize_capture_url, parse_capture_response, representative_color_hex, CaptureInfo, TileMixer};
pub use frame_clock::{clamp_elapsed, FrameClock, FIRST_FRAME_MS};
pub use frame_stats::FrameStats;
pub use governor::{clamp_angular_speed, clamp_speed, VelocityGovernor};
pub use mixing::MixingForceModel;
pub use render_loop::{Capture, FrameOutcome, RenderLoop};
pub use scheduler::FrameScheduler;
pub use surface::{DrawingSurface, Outline, SurfaceError, TilePlacement};
pub use world::{PhysicsWorld, TileBody};

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
