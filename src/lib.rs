//! Blenda Engine - tile mixing simulation in WASM
//!
//! A captured screenshot is cut into tiles that tumble inside a square
//! container; turning a knob rotates the container and stirs the tiles.
//!
//! Architecture:
//! - core/        - Logging macros
//! - domain/      - Tile grids, settings, capture payloads, colours
//! - systems/     - Physics engine trait and its rapier2d implementation
//! - simulation/  - World building, per-frame pipeline, canvas facade

// Must come first so the logging macros are visible everywhere.
#[macro_use]
pub mod core;
pub mod domain;
pub mod systems;
pub mod simulation;

pub use systems::engine;
pub use systems::vec2;
pub use systems::rigid_body_system;

use wasm_bindgen::prelude::*;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    console_log!("Blenda engine {} initialized", version());
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub use domain::settings::SimulationSettings;
pub use simulation::{RenderLoop, TileMixer, WorldBuilder};
