use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlImageElement};

use crate::domain::capture::{self, CaptureResult};
use crate::domain::color::{representative_color, Rgb};
use crate::domain::settings::SimulationSettings;
use crate::rigid_body_system::RigidBodySystem;

use super::canvas::CanvasSurface;
use super::drag::{ControlBounds, PointerSample, RotationController, SharedDragState};
use super::frame_stats::FrameStats;
use super::render_loop::{Capture, FrameOutcome, RenderLoop};
use super::scheduler::FrameScheduler;

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

struct MixerCore {
    render: RenderLoop<RigidBodySystem, HtmlImageElement>,
    surface: CanvasSurface,
}

impl MixerCore {
    fn frame(&mut self, now_ms: f64) -> FrameOutcome {
        let MixerCore { render, surface } = self;
        render.frame(now_ms, surface)
    }

    fn tick(&mut self, elapsed_ms: f64) -> FrameOutcome {
        let MixerCore { render, surface } = self;
        render.tick(elapsed_ms, surface)
    }
}

/// Browser entry point: one canvas, one knob, one world at a time.
#[wasm_bindgen]
pub struct TileMixer {
    core: Rc<RefCell<MixerCore>>,
    controller: RotationController,
    rng: SmallRng,
    scheduler: Option<FrameScheduler>,
}

#[wasm_bindgen]
impl TileMixer {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement) -> Result<TileMixer, JsValue> {
        let drag = SharedDragState::new();
        let render = RenderLoop::new(SimulationSettings::default(), drag.clone()).map_err(js_err)?;
        let surface = CanvasSurface::new(canvas).map_err(js_err)?;
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;

        Ok(Self {
            core: Rc::new(RefCell::new(MixerCore { render, surface })),
            controller: RotationController::new(drag),
            rng: SmallRng::seed_from_u64(seed),
            scheduler: None,
        })
    }

    /// Reseeds tile jitter and initial velocities for the next `load_image`.
    pub fn set_seed(&mut self, seed: u32) {
        self.rng = SmallRng::seed_from_u64(seed as u64);
    }

    /// Settings JSON (camelCase, every field optional).
    pub fn load_settings_json(&mut self, json: &str) -> Result<(), JsValue> {
        let settings = SimulationSettings::from_json(json).map_err(js_err)?;
        self.core.borrow_mut().render.set_settings(settings).map_err(js_err)
    }

    /// Builds a world for a decoded image, sizes the canvas to the container
    /// and starts the frame loop.
    pub fn load_image(&mut self, image: HtmlImageElement, width: u32, height: u32) -> Result<(), JsValue> {
        self.stop_scheduler();

        if !image.complete() || image.natural_width() == 0 || image.natural_height() == 0 {
            self.image_failed(width, height);
            return Err(JsValue::from_str("Image is not decoded"));
        }

        {
            let mut core = self.core.borrow_mut();
            let capture = Capture { image, width, height };
            core.render
                .load_capture(capture, RigidBodySystem::new(), &mut self.rng)
                .map_err(js_err)?;
            if let Some(side) = core.render.container_side() {
                let side = side.ceil() as u32;
                core.surface.resize(side, side);
            }
        }

        self.start()
    }

    /// Decode failure: drops the world and paints the fallback colour over
    /// `width x height`.
    pub fn image_failed(&mut self, width: u32, height: u32) {
        self.stop_scheduler();
        let mut core = self.core.borrow_mut();
        let MixerCore { render, surface } = &mut *core;
        if let Err(err) = render.capture_failed(surface, width as f64, height as f64) {
            console_warn!("fallback fill failed: {}", err);
        }
    }

    /// Starts the `requestAnimationFrame` loop for the current world.
    pub fn start(&mut self) -> Result<(), JsValue> {
        if self.scheduler.as_ref().is_some_and(FrameScheduler::is_active) {
            return Ok(());
        }

        let core = self.core.clone();
        let generation = core.borrow().render.generation();
        let scheduler = FrameScheduler::start(move |now_ms| {
            let Ok(mut core) = core.try_borrow_mut() else {
                return true;
            };
            if core.render.generation() != generation {
                return false;
            }
            !matches!(core.frame(now_ms), FrameOutcome::Stopped)
        })?;
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Manual frame at a display timestamp. Returns whether anything was drawn.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        matches!(self.core.borrow_mut().frame(now_ms), FrameOutcome::Rendered { .. })
    }

    /// Manual frame with an explicit elapsed time.
    pub fn tick(&mut self, elapsed_ms: f64) -> bool {
        matches!(self.core.borrow_mut().tick(elapsed_ms), FrameOutcome::Rendered { .. })
    }

    /// Stops the frame loop and releases the world.
    pub fn teardown(&mut self) {
        self.stop_scheduler();
        self.controller.drag_end();
        self.core.borrow_mut().render.teardown();
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, left: f64, top: f64, width: f64, height: f64) {
        self.controller
            .drag_start(PointerSample::new(x, y), &ControlBounds { left, top, width, height });
    }

    /// Returns the applied angle delta, 0 outside a drag.
    pub fn pointer_move(&mut self, x: f64, y: f64, left: f64, top: f64, width: f64, height: f64) -> f64 {
        self.controller
            .drag_move(PointerSample::new(x, y), &ControlBounds { left, top, width, height })
            .unwrap_or(0.0)
    }

    pub fn pointer_up(&mut self) {
        self.controller.drag_end();
    }

    #[wasm_bindgen(getter)]
    pub fn container_size(&self) -> f32 {
        self.core.borrow().render.container_side().unwrap_or(0.0)
    }

    #[wasm_bindgen(getter)]
    pub fn container_angle(&self) -> f64 {
        self.controller.state().snapshot().container_angle
    }

    #[wasm_bindgen(getter)]
    pub fn knob_degrees(&self) -> f64 {
        self.controller.state().snapshot().knob_degrees()
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.controller.state().snapshot().is_dragging
    }

    #[wasm_bindgen(getter)]
    pub fn tile_count(&self) -> u32 {
        self.core
            .borrow()
            .render
            .world()
            .map_or(0, |w| w.tile_count() as u32)
    }

    #[wasm_bindgen(getter)]
    pub fn is_running(&self) -> bool {
        self.scheduler.as_ref().is_some_and(FrameScheduler::is_active)
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.core.borrow().render.stats()
    }

    fn stop_scheduler(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop();
        }
    }
}

/// Parsed capture endpoint response.
#[wasm_bindgen]
pub struct CaptureInfo {
    image_data_url: String,
    width: u32,
    height: u32,
    bounding_box_count: u32,
}

#[wasm_bindgen]
impl CaptureInfo {
    #[wasm_bindgen(getter)]
    pub fn image_data_url(&self) -> String { self.image_data_url.clone() }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 { self.width }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 { self.height }

    #[wasm_bindgen(getter)]
    pub fn bounding_box_count(&self) -> u32 { self.bounding_box_count }
}

impl From<CaptureResult> for CaptureInfo {
    fn from(result: CaptureResult) -> Self {
        Self {
            image_data_url: result.image_data_url(),
            width: result.metadata.width,
            height: result.metadata.height,
            bounding_box_count: result.metadata.bounding_boxes.as_ref().map_or(0, |b| b.len() as u32),
        }
    }
}

/// Absolute `http(s)` URL for the capture endpoint.
#[wasm_bindgen]
pub fn normalize_capture_url(input: &str) -> Result<String, JsValue> {
    capture::normalize_capture_url(input).map_err(js_err)
}

#[wasm_bindgen]
pub fn parse_capture_response(json: &str) -> Result<CaptureInfo, JsValue> {
    CaptureResult::from_json(json).map(CaptureInfo::from).map_err(js_err)
}

/// Average colour of RGBA pixel data as `#rrggbb`; `#000000` when every
/// pixel is transparent.
#[wasm_bindgen]
pub fn representative_color_hex(rgba: &[u8]) -> String {
    representative_color(rgba).unwrap_or(Rgb::BLACK).to_hex()
}
