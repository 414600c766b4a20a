use crate::domain::settings::SimulationSettings;
use crate::engine::PhysicsEngine;
use crate::vec2::Vec2;

use super::world::PhysicsWorld;

/// Tiles closer than this to the center get no orbit force.
const MIN_RADIUS: f32 = 1e-3;

/// Tangential "orbit" push applied to every tile when the knob turns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixingForceModel {
    /// px/s² per radian of rotation at radius factor 1.
    pub strength: f32,
    pub epsilon: f32,
    pub max_radius_factor: f32,
}

impl MixingForceModel {
    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self {
            strength: settings.mixing_strength,
            epsilon: settings.mixing_epsilon,
            max_radius_factor: settings.max_radius_factor,
        }
    }

    /// Unit tangent for a tile at `offset` from the center: `(dy, -dx) / |offset|`.
    pub fn tangent(offset: Vec2) -> Option<Vec2> {
        let dist = offset.length();
        if !(dist > MIN_RADIUS) || !dist.is_finite() {
            return None;
        }
        Some(Vec2::new(offset.y / dist, -offset.x / dist))
    }

    /// Grows linearly with distance, reaching 1 at the container half side.
    pub fn radius_factor(&self, dist: f32, half_side: f32) -> f32 {
        if half_side <= 0.0 {
            return 0.0;
        }
        (dist / half_side).min(self.max_radius_factor)
    }

    /// Applies the orbit force for one frame's rotation `delta` (radians).
    /// Returns the number of tiles pushed; zero when `|delta|` is below epsilon.
    pub fn apply<E: PhysicsEngine>(&self, world: &mut PhysicsWorld<E>, delta: f32) -> usize {
        if !delta.is_finite() || delta.abs() < self.epsilon {
            return 0;
        }

        let (engine, container, tiles) = world.parts_mut();
        let center = container.center();
        let half_side = container.side() / 2.0;

        let mut pushed = 0;
        for tile in tiles {
            let Some(pose) = engine.pose(tile.body) else {
                continue;
            };
            let Some(mass) = engine.mass(tile.body) else {
                continue;
            };
            let offset = pose.position - center;
            let Some(tangent) = Self::tangent(offset) else {
                continue;
            };
            let factor = self.radius_factor(offset.length(), half_side);
            engine.apply_force(tile.body, tangent * (delta * self.strength * factor * mass));
            pushed += 1;
        }
        pushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_is_perpendicular_unit_vector() {
        let t = MixingForceModel::tangent(Vec2::new(3.0, 4.0)).unwrap();
        assert!((t.length() - 1.0).abs() < 1e-6);
        assert!(t.dot(Vec2::new(3.0, 4.0)).abs() < 1e-6);
        assert_eq!(t, Vec2::new(0.8, -0.6));
        assert_eq!(MixingForceModel::tangent(Vec2::zero()), None);
    }

    #[test]
    fn radius_factor_is_capped() {
        let model = MixingForceModel::from_settings(&SimulationSettings::default());
        assert_eq!(model.radius_factor(0.0, 100.0), 0.0);
        assert_eq!(model.radius_factor(50.0, 100.0), 0.5);
        assert_eq!(model.radius_factor(400.0, 100.0), model.max_radius_factor);
    }
}
