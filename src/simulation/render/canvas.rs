use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::domain::color::Rgb;
use crate::domain::tiles::TileSpec;

use super::surface::{DrawingSurface, Outline, SurfaceError, TilePlacement};

fn backend(err: JsValue) -> SurfaceError {
    SurfaceError::Backend(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

/// `DrawingSurface` over a canvas 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SurfaceError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(backend)?
            .ok_or(SurfaceError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SurfaceError::NoContext)?;
        Ok(Self { canvas, ctx })
    }

    /// Matches the backing store to the container, in CSS pixels.
    pub fn resize(&self, width: u32, height: u32) {
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Runs `draw` between `save` and `restore` with the origin moved to
    /// `(x, y)` and rotated by `angle`. The state is restored on error too.
    fn with_transform<F>(&self, x: f64, y: f64, angle: f64, draw: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(&CanvasRenderingContext2d) -> Result<(), JsValue>,
    {
        self.ctx.save();
        let result = self
            .ctx
            .translate(x, y)
            .and_then(|_| self.ctx.rotate(angle))
            .and_then(|_| draw(&self.ctx));
        self.ctx.restore();
        result.map_err(backend)
    }
}

impl DrawingSurface for CanvasSurface {
    type Image = HtmlImageElement;

    fn clear(&mut self, width: f64, height: f64) -> Result<(), SurfaceError> {
        self.ctx.clear_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn fill(&mut self, color: Rgb, width: f64, height: f64) -> Result<(), SurfaceError> {
        self.ctx.set_fill_style_str(&color.to_hex());
        self.ctx.fill_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn draw_image_region(
        &mut self,
        image: &HtmlImageElement,
        source: &TileSpec,
        placement: TilePlacement,
    ) -> Result<(), SurfaceError> {
        let (w, h) = (placement.width, placement.height);
        self.with_transform(
            placement.center.x as f64,
            placement.center.y as f64,
            placement.angle,
            |ctx| {
                ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    image,
                    source.source_x as f64,
                    source.source_y as f64,
                    source.source_width as f64,
                    source.source_height as f64,
                    -w / 2.0,
                    -h / 2.0,
                    w,
                    h,
                )
            },
        )
    }

    fn stroke_rotated_rect(&mut self, outline: &Outline) -> Result<(), SurfaceError> {
        self.ctx.set_stroke_style_str(&outline.color.to_hex());
        self.ctx.set_line_width(outline.line_width);
        let (w, h) = (outline.width, outline.height);
        self.with_transform(
            outline.center.x as f64,
            outline.center.y as f64,
            outline.angle,
            |ctx| {
                ctx.stroke_rect(-w / 2.0, -h / 2.0, w, h);
                Ok(())
            },
        )
    }
}
