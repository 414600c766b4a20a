use std::fmt;

use crate::domain::color::Rgb;
use crate::domain::tiles::TileSpec;
use crate::vec2::Vec2;

/// Destination of a tile draw: the image region is drawn centered on
/// `center`, rotated by `angle`, scaled to `width x height`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePlacement {
    pub center: Vec2,
    pub angle: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    pub center: Vec2,
    pub angle: f64,
    pub width: f64,
    pub height: f64,
    pub color: Rgb,
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// The drawing backend rejected a call.
    Backend(String),
    /// No 2D context could be obtained for the target element.
    NoContext,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Backend(msg) => write!(f, "Drawing failed: {}", msg),
            SurfaceError::NoContext => write!(f, "No 2D drawing context available"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Drawing primitives the render loop needs and nothing else.
pub trait DrawingSurface {
    type Image;

    fn clear(&mut self, width: f64, height: f64) -> Result<(), SurfaceError>;

    fn fill(&mut self, color: Rgb, width: f64, height: f64) -> Result<(), SurfaceError>;

    fn draw_image_region(
        &mut self,
        image: &Self::Image,
        source: &TileSpec,
        placement: TilePlacement,
    ) -> Result<(), SurfaceError>;

    fn stroke_rotated_rect(&mut self, outline: &Outline) -> Result<(), SurfaceError>;
}
