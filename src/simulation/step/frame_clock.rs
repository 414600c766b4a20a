/// Elapsed time assumed for the first frame after a (re)start.
pub const FIRST_FRAME_MS: f64 = 1000.0 / 60.0;

/// Turns display-refresh timestamps into per-frame elapsed times.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed milliseconds since the previous call. Timestamps that go
    /// backwards report zero.
    pub fn advance(&mut self, now_ms: f64) -> f64 {
        let elapsed = match self.last_ms {
            Some(last) => now_ms - last,
            None => FIRST_FRAME_MS,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }
        elapsed.max(0.0)
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Clamps a frame's elapsed time to `[0, max_ms]`; non-finite input gives 0.
pub fn clamp_elapsed(elapsed_ms: f64, max_ms: f32) -> f32 {
    if !elapsed_ms.is_finite() {
        return 0.0;
    }
    (elapsed_ms as f32).clamp(0.0, max_ms)
}
