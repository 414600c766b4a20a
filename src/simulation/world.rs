use crate::domain::tiles::{GridDims, TileSpec};
use crate::engine::{BodyHandle, BodyPose, PhysicsEngine};
use crate::vec2::Vec2;

use super::container::ContainerFrame;

/// A tile body and the image rectangle it shows. The pairing never changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileBody {
    pub body: BodyHandle,
    pub spec: TileSpec,
}

/// The live world for one displayed capture.
///
/// Owns its engine. Dropping the world releases every body and composite
/// from the engine first.
#[derive(Debug)]
pub struct PhysicsWorld<E: PhysicsEngine> {
    engine: E,
    container: ContainerFrame,
    tiles: Vec<TileBody>,
    grid: GridDims,
    image_size: (u32, u32),
    image_offset: Vec2,
}

impl<E: PhysicsEngine> PhysicsWorld<E> {
    pub(crate) fn new(
        engine: E,
        container: ContainerFrame,
        tiles: Vec<TileBody>,
        grid: GridDims,
        image_size: (u32, u32),
        image_offset: Vec2,
    ) -> Self {
        Self {
            engine,
            container,
            tiles,
            grid,
            image_size,
            image_offset,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn container(&self) -> &ContainerFrame {
        &self.container
    }

    pub fn tiles(&self) -> &[TileBody] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn grid(&self) -> GridDims {
        self.grid
    }

    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    /// Where the image's top-left corner sat when the world was built.
    pub fn image_offset(&self) -> Vec2 {
        self.image_offset
    }

    pub fn tile_pose(&self, index: usize) -> Option<BodyPose> {
        self.tiles.get(index).and_then(|t| self.engine.pose(t.body))
    }

    /// Split borrow for per-tile passes that also drive the engine.
    pub(crate) fn parts_mut(&mut self) -> (&mut E, &ContainerFrame, &[TileBody]) {
        (&mut self.engine, &self.container, &self.tiles)
    }

    /// Queues a turn of the wall composite about the container center. The
    /// walls sweep through it during the next `step`.
    pub fn rotate_container(&mut self, delta: f32) {
        self.container.rotate(&mut self.engine, delta);
    }

    pub fn step(&mut self, dt_ms: f32) {
        self.engine.step(dt_ms);
    }
}

impl<E: PhysicsEngine> Drop for PhysicsWorld<E> {
    fn drop(&mut self) {
        self.engine.release();
    }
}
