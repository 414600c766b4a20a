use std::fmt;

use rand::Rng;

use crate::domain::settings::{SettingsError, SimulationSettings};
use crate::domain::tiles::{grid_dimensions, tile_specs, TileSpec};
use crate::engine::{BodyDesc, EngineError, PhysicsEngine};
use crate::vec2::Vec2;

use super::container::ContainerFrame;
use super::world::{PhysicsWorld, TileBody};

#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The image has no area, or too little to give every tile a pixel.
    DegenerateImage { width: u32, height: u32 },
    InvalidSettings(SettingsError),
    Engine(EngineError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::DegenerateImage { width, height } => {
                write!(f, "Cannot build a world for a {}x{} image", width, height)
            }
            BuildError::InvalidSettings(err) => write!(f, "Invalid settings: {}", err),
            BuildError::Engine(err) => write!(f, "Physics engine error: {}", err),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::InvalidSettings(err) => Some(err),
            BuildError::Engine(err) => Some(err),
            BuildError::DegenerateImage { .. } => None,
        }
    }
}

impl From<EngineError> for BuildError {
    fn from(err: EngineError) -> Self {
        BuildError::Engine(err)
    }
}

impl From<SettingsError> for BuildError {
    fn from(err: SettingsError) -> Self {
        BuildError::InvalidSettings(err)
    }
}

/// Builds one `PhysicsWorld` per captured image.
///
/// The container side is `max(W, H) + 2 * padding`; the image is centered in
/// it, so for a landscape image the tile field touches the padding on the left
/// and right and leaves extra space above and below.
pub struct WorldBuilder<'a> {
    settings: &'a SimulationSettings,
}

impl<'a> WorldBuilder<'a> {
    pub fn new(settings: &'a SimulationSettings) -> Self {
        Self { settings }
    }

    /// Container side for an image, before any world exists.
    pub fn container_side(&self, width: u32, height: u32) -> f32 {
        width.max(height) as f32 + 2.0 * self.settings.container_padding
    }

    /// Top-left corner of the image inside the container.
    pub fn image_offset(&self, width: u32, height: u32) -> Vec2 {
        let longest = width.max(height) as f32;
        let pad = self.settings.container_padding;
        Vec2::new(
            pad + (longest - width as f32) / 2.0,
            pad + (longest - height as f32) / 2.0,
        )
    }

    /// Registers the container and every tile with `engine`.
    ///
    /// Takes ownership of the engine: on failure everything created so far is
    /// released before the engine is dropped, so a failed build never leaves
    /// orphan bodies behind.
    pub fn build<E, R>(&self, mut engine: E, width: u32, height: u32, rng: &mut R) -> Result<PhysicsWorld<E>, BuildError>
    where
        E: PhysicsEngine,
        R: Rng + ?Sized,
    {
        self.settings.validate()?;

        let degenerate = BuildError::DegenerateImage { width, height };
        let grid = grid_dimensions(width, height, self.settings.tile_count).ok_or_else(|| degenerate.clone())?;
        let specs = tile_specs(width, height, grid);
        if specs.iter().any(|spec| spec.area() == 0) {
            return Err(degenerate);
        }

        match self.populate(&mut engine, width, height, &specs, rng) {
            Ok((container, tiles)) => {
                console_log!(
                    "world built: {} tiles ({}x{}), container {}px",
                    tiles.len(),
                    grid.cols,
                    grid.rows,
                    container.side()
                );
                Ok(PhysicsWorld::new(
                    engine,
                    container,
                    tiles,
                    grid,
                    (width, height),
                    self.image_offset(width, height),
                ))
            }
            Err(err) => {
                engine.release();
                Err(err)
            }
        }
    }

    fn populate<E, R>(
        &self,
        engine: &mut E,
        width: u32,
        height: u32,
        specs: &[TileSpec],
        rng: &mut R,
    ) -> Result<(ContainerFrame, Vec<TileBody>), BuildError>
    where
        E: PhysicsEngine,
        R: Rng + ?Sized,
    {
        let s = self.settings;
        engine.set_gravity(Vec2::new(s.gravity.x, s.gravity.y));

        let side = self.container_side(width, height);
        let container = ContainerFrame::build(engine, side, s.wall_thickness, s.friction)?;

        let offset = self.image_offset(width, height);
        let mut tiles = Vec::with_capacity(specs.len());
        for spec in specs {
            let (cx, cy) = spec.source_center();
            let jitter = Vec2::new(
                symmetric(rng, s.position_jitter),
                symmetric(rng, s.position_jitter),
            );
            let position = offset + Vec2::new(cx, cy) + jitter;

            let desc = BodyDesc::dynamic(position, spec.source_width as f32, spec.source_height as f32)
                .with_material(s.restitution, s.friction, s.density);
            let body = engine.create_body(&desc)?;

            engine.set_velocity(
                body,
                Vec2::new(
                    symmetric(rng, s.initial_speed_max),
                    symmetric(rng, s.initial_speed_max),
                ),
            );
            engine.set_angular_velocity(body, symmetric(rng, s.initial_angular_speed_max));

            tiles.push(TileBody { body, spec: *spec });
        }

        Ok((container, tiles))
    }
}

/// Uniform sample in `[-max, max]`; zero when `max` is zero.
fn symmetric<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    if max > 0.0 {
        rng.gen_range(-max..=max)
    } else {
        0.0
    }
}
