use crate::engine::{BodyDesc, BodyHandle, CompositeHandle, EngineError, PhysicsEngine};
use crate::vec2::Vec2;

/// Square wall frame around the tile field.
///
/// The inner faces of the walls lie exactly on `[0, side]` on both axes; the
/// wall thickness extends outward so tiles are never clipped by a wall.
#[derive(Debug)]
pub struct ContainerFrame {
    side: f32,
    wall_thickness: f32,
    center: Vec2,
    walls: [BodyHandle; 4],
    composite: CompositeHandle,
}

impl ContainerFrame {
    /// Left, right, top, bottom wall descriptions for a container of `side`.
    pub fn wall_descs(side: f32, thickness: f32) -> [BodyDesc; 4] {
        let half = thickness / 2.0;
        let span = side + thickness * 2.0;
        let mid = side / 2.0;
        [
            BodyDesc::fixed(Vec2::new(-half, mid), thickness, span),
            BodyDesc::fixed(Vec2::new(side + half, mid), thickness, span),
            BodyDesc::fixed(Vec2::new(mid, -half), span, thickness),
            BodyDesc::fixed(Vec2::new(mid, side + half), span, thickness),
        ]
    }

    pub(crate) fn build<E: PhysicsEngine>(
        engine: &mut E,
        side: f32,
        thickness: f32,
        friction: f32,
    ) -> Result<Self, EngineError> {
        let descs = Self::wall_descs(side, thickness);
        let mut walls = [BodyHandle(0); 4];
        for (slot, desc) in walls.iter_mut().zip(descs.iter()) {
            *slot = engine.create_body(&desc.with_material(0.0, friction, desc.density))?;
        }
        let composite = engine.create_composite(&walls)?;

        Ok(Self {
            side,
            wall_thickness: thickness,
            center: Vec2::new(side / 2.0, side / 2.0),
            walls,
            composite,
        })
    }

    pub fn width(&self) -> f32 {
        self.side
    }

    pub fn height(&self) -> f32 {
        self.side
    }

    pub fn side(&self) -> f32 {
        self.side
    }

    pub fn wall_thickness(&self) -> f32 {
        self.wall_thickness
    }

    /// Rotation pivot and reference point for mixing radii.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn walls(&self) -> &[BodyHandle; 4] {
        &self.walls
    }

    pub(crate) fn rotate<E: PhysicsEngine>(&self, engine: &mut E, delta: f32) {
        engine.rotate_composite(self.composite, delta, self.center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_inner_faces_sit_on_the_boundary() {
        let side = 500.0;
        let t = 60.0;
        let [left, right, top, bottom] = ContainerFrame::wall_descs(side, t);

        assert_eq!(left.position.x + left.width / 2.0, 0.0);
        assert_eq!(right.position.x - right.width / 2.0, side);
        assert_eq!(top.position.y + top.height / 2.0, 0.0);
        assert_eq!(bottom.position.y - bottom.height / 2.0, side);

        // Corners are covered: side walls span past the top and bottom walls.
        assert_eq!(left.height, side + 2.0 * t);
        assert_eq!(top.width, side + 2.0 * t);
        assert!([left, right, top, bottom].iter().all(|w| w.is_static));
    }
}
