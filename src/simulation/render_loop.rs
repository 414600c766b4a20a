use rand::Rng;

use crate::domain::color::Rgb;
use crate::domain::settings::{SettingsError, SimulationSettings};
use crate::engine::PhysicsEngine;

use super::builder::{BuildError, WorldBuilder};
use super::draw::draw_frame;
use super::drag::{normalize_angle_delta, SharedDragState};
use super::frame_clock::{clamp_elapsed, FrameClock};
use super::frame_stats::FrameStats;
use super::governor::VelocityGovernor;
use super::mixing::MixingForceModel;
use super::perf_timer::PerfTimer;
use super::surface::{DrawingSurface, SurfaceError};
use super::world::PhysicsWorld;

/// A decoded capture and its pixel size.
pub struct Capture<I> {
    pub image: I,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Torn down; the scheduler should stop.
    Stopped,
    /// No world or no image yet. Nothing was touched.
    Idle,
    Rendered {
        tiles_drawn: usize,
        /// Container rotation applied this frame.
        delta: f64,
    },
}

/// Per-frame driver: rotation, mixing, step, governance, draw.
///
/// Holds at most one world. Every entry point tolerates a missing world or
/// image, so frames racing a rebuild or a teardown are harmless no-ops.
pub struct RenderLoop<E: PhysicsEngine, I> {
    settings: SimulationSettings,
    outline_color: Rgb,
    fallback_color: Rgb,
    mixing: MixingForceModel,
    governor: VelocityGovernor,
    drag: SharedDragState,
    world: Option<PhysicsWorld<E>>,
    capture: Option<Capture<I>>,
    prev_angle: Option<f64>,
    clock: FrameClock,
    running: bool,
    generation: u64,
    stats: FrameStats,
}

impl<E: PhysicsEngine, I> RenderLoop<E, I> {
    pub fn new(settings: SimulationSettings, drag: SharedDragState) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            outline_color: settings.outline_rgb()?,
            fallback_color: settings.fallback_rgb()?,
            mixing: MixingForceModel::from_settings(&settings),
            governor: VelocityGovernor::from_settings(&settings),
            settings,
            drag,
            world: None,
            capture: None,
            prev_angle: None,
            clock: FrameClock::new(),
            running: true,
            generation: 0,
            stats: FrameStats::default(),
        })
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Force model, ceilings and colours apply from the next frame; geometry
    /// from the next `load_capture`.
    pub fn set_settings(&mut self, settings: SimulationSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.outline_color = settings.outline_rgb()?;
        self.fallback_color = settings.fallback_rgb()?;
        self.mixing = MixingForceModel::from_settings(&settings);
        self.governor = VelocityGovernor::from_settings(&settings);
        self.settings = settings;
        Ok(())
    }

    pub fn drag_state(&self) -> &SharedDragState {
        &self.drag
    }

    /// Replaces the current world with one built for `capture`.
    ///
    /// The previous world is released before the new one is built. On failure
    /// the loop is left without a world and idles until the next capture.
    pub fn load_capture<R>(&mut self, capture: Capture<I>, engine: E, rng: &mut R) -> Result<(), BuildError>
    where
        R: Rng + ?Sized,
    {
        self.clear_world();
        self.generation += 1;
        self.running = true;

        let world = WorldBuilder::new(&self.settings)
            .build(engine, capture.width, capture.height, rng)
            .map_err(|err| {
                console_warn!("world build failed: {}", err);
                err
            })?;

        self.stats.tile_count = world.tile_count() as u32;
        self.world = Some(world);
        self.capture = Some(capture);
        Ok(())
    }

    /// Image decode failed: drop any world and paint the fallback colour.
    pub fn capture_failed<S>(&mut self, surface: &mut S, width: f64, height: f64) -> Result<(), SurfaceError>
    where
        S: DrawingSurface<Image = I>,
    {
        console_warn!("capture could not be decoded, drawing fallback");
        self.clear_world();
        self.generation += 1;
        surface.fill(self.fallback_color, width, height)
    }

    /// Timestamp-driven frame, as delivered by the display refresh callback.
    pub fn frame<S>(&mut self, now_ms: f64, surface: &mut S) -> FrameOutcome
    where
        S: DrawingSurface<Image = I>,
    {
        let elapsed = self.clock.advance(now_ms);
        self.tick(elapsed, surface)
    }

    /// One frame with an explicit elapsed time, clamped to the frame budget.
    pub fn tick<S>(&mut self, elapsed_ms: f64, surface: &mut S) -> FrameOutcome
    where
        S: DrawingSurface<Image = I>,
    {
        if !self.running {
            return FrameOutcome::Stopped;
        }
        let (Some(world), Some(capture)) = (self.world.as_mut(), self.capture.as_ref()) else {
            return FrameOutcome::Idle;
        };

        let frame_timer = PerfTimer::start();
        let dt_ms = clamp_elapsed(elapsed_ms, self.settings.max_frame_step_ms);

        // One read per frame; everything below uses this snapshot.
        let drag = self.drag.snapshot();
        let prev = *self.prev_angle.get_or_insert(drag.container_angle);
        let delta = normalize_angle_delta(drag.container_angle - prev);
        self.prev_angle = Some(drag.container_angle);

        if delta != 0.0 {
            world.rotate_container(delta as f32);
        }
        self.mixing.apply(world, delta as f32);

        let mut timer = PerfTimer::start();
        world.step(dt_ms);
        let clamped = self.governor.govern(world);
        let step_ms = timer.lap_ms();

        let tiles_drawn = match draw_frame(surface, &capture.image, world, drag.container_angle, self.outline_color) {
            Ok(drawn) => drawn,
            Err(err) => {
                console_warn!("frame draw failed: {}", err);
                0
            }
        };

        self.stats = FrameStats {
            step_ms,
            draw_ms: timer.lap_ms(),
            frame_ms: frame_timer.elapsed_ms(),
            tiles_clamped: clamped as u32,
            tile_count: world.tile_count() as u32,
            frames: self.stats.frames + 1,
            last_delta: delta,
        };

        FrameOutcome::Rendered { tiles_drawn, delta }
    }

    /// Stops the loop and releases the world. Later frames report `Stopped`.
    pub fn teardown(&mut self) {
        if self.world.is_some() {
            console_log!("tearing down world");
        }
        self.clear_world();
        self.running = false;
        self.generation += 1;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Bumped whenever the world is replaced or torn down. A scheduler started
    /// for one generation stops once it changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn world(&self) -> Option<&PhysicsWorld<E>> {
        self.world.as_ref()
    }

    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }

    pub fn container_side(&self) -> Option<f32> {
        self.world.as_ref().map(|w| w.container().side())
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    fn clear_world(&mut self) {
        // Dropping the world releases its engine resources.
        self.world = None;
        self.capture = None;
        self.prev_angle = None;
        self.clock.reset();
        self.stats = FrameStats::default();
    }
}
