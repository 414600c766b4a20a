use wasm_bindgen::prelude::*;

/// Snapshot of the last rendered frame.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub(crate) step_ms: f64,
    pub(crate) draw_ms: f64,
    pub(crate) frame_ms: f64,
    pub(crate) tiles_clamped: u32,
    pub(crate) tile_count: u32,
    pub(crate) frames: u64,
    pub(crate) last_delta: f64,
}

#[wasm_bindgen]
impl FrameStats {
    /// Engine step plus governor.
    #[wasm_bindgen(getter)]
    pub fn step_ms(&self) -> f64 { self.step_ms }

    #[wasm_bindgen(getter)]
    pub fn draw_ms(&self) -> f64 { self.draw_ms }

    /// Whole tick, including rotation and mixing.
    #[wasm_bindgen(getter)]
    pub fn frame_ms(&self) -> f64 { self.frame_ms }

    /// Tiles the governor had to slow down this frame.
    #[wasm_bindgen(getter)]
    pub fn tiles_clamped(&self) -> u32 { self.tiles_clamped }

    #[wasm_bindgen(getter)]
    pub fn tile_count(&self) -> u32 { self.tile_count }

    /// Frames rendered since the current world was built.
    #[wasm_bindgen(getter)]
    pub fn frames(&self) -> u64 { self.frames }

    /// Container rotation applied this frame, radians.
    #[wasm_bindgen(getter)]
    pub fn last_delta(&self) -> f64 { self.last_delta }
}
