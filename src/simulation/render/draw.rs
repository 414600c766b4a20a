use crate::domain::color::Rgb;
use crate::engine::PhysicsEngine;

use super::surface::{DrawingSurface, Outline, SurfaceError, TilePlacement};
use super::world::PhysicsWorld;

pub(crate) const OUTLINE_WIDTH_PX: f64 = 2.0;

/// Clears the container area, draws every tile at its body pose, then the
/// container outline at `container_angle`.
pub(crate) fn draw_frame<S, E>(
    surface: &mut S,
    image: &S::Image,
    world: &PhysicsWorld<E>,
    container_angle: f64,
    outline_color: Rgb,
) -> Result<usize, SurfaceError>
where
    S: DrawingSurface,
    E: PhysicsEngine,
{
    let container = world.container();
    let side = container.side() as f64;
    surface.clear(side, side)?;

    let engine = world.engine();
    let mut drawn = 0;
    for tile in world.tiles() {
        // Bodies can be gone after a release racing the frame; skip them.
        let Some(pose) = engine.pose(tile.body) else {
            continue;
        };
        let placement = TilePlacement {
            center: pose.position,
            angle: pose.angle as f64,
            width: tile.spec.source_width as f64,
            height: tile.spec.source_height as f64,
        };
        surface.draw_image_region(image, &tile.spec, placement)?;
        drawn += 1;
    }

    surface.stroke_rotated_rect(&Outline {
        center: container.center(),
        angle: container_angle,
        width: side,
        height: side,
        color: outline_color,
        line_width: OUTLINE_WIDTH_PX,
    })?;

    Ok(drawn)
}
