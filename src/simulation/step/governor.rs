use crate::domain::settings::SimulationSettings;
use crate::engine::PhysicsEngine;
use crate::vec2::Vec2;

use super::world::PhysicsWorld;

/// Post-step speed ceilings for tiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityGovernor {
    pub max_speed: f32,
    pub max_angular_speed: f32,
}

impl VelocityGovernor {
    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self {
            max_speed: settings.max_speed,
            max_angular_speed: settings.max_angular_speed,
        }
    }

    /// Clamps every tile; returns how many tiles needed it.
    pub fn govern<E: PhysicsEngine>(&self, world: &mut PhysicsWorld<E>) -> usize {
        let (engine, _, tiles) = world.parts_mut();
        let mut clamped = 0;
        for tile in tiles {
            let mut hit = false;
            if let Some(v) = engine.velocity(tile.body).and_then(|v| clamp_speed(v, self.max_speed)) {
                engine.set_velocity(tile.body, v);
                hit = true;
            }
            if let Some(w) = engine
                .angular_velocity(tile.body)
                .and_then(|w| clamp_angular_speed(w, self.max_angular_speed))
            {
                engine.set_angular_velocity(tile.body, w);
                hit = true;
            }
            if hit {
                clamped += 1;
            }
        }
        clamped
    }
}

/// Velocity rescaled to exactly `max`, or `None` if already within it.
/// A non-finite velocity has no usable direction and is zeroed.
pub fn clamp_speed(velocity: Vec2, max: f32) -> Option<Vec2> {
    if !velocity.is_finite() {
        return Some(Vec2::zero());
    }
    if velocity.length() <= max {
        return None;
    }
    // Normalise by the larger component first: near f32::MAX the length overflows.
    let scale = velocity.x.abs().max(velocity.y.abs());
    let direction = velocity * (1.0 / scale);
    Some(direction * (max / direction.length()))
}

/// Angular velocity clamped to `±max`, or `None` if already within it.
/// NaN and infinite spin are zeroed.
pub fn clamp_angular_speed(angular_velocity: f32, max: f32) -> Option<f32> {
    if !angular_velocity.is_finite() {
        return Some(0.0);
    }
    if angular_velocity.abs() <= max {
        return None;
    }
    Some(max.copysign(angular_velocity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_velocity_is_rescaled_to_ceiling() {
        let v = clamp_speed(Vec2::new(300.0, -400.0), 100.0).unwrap();
        assert!((v.length() - 100.0).abs() < 1e-3);
        assert!((v.x - 60.0).abs() < 1e-4 && (v.y + 80.0).abs() < 1e-4);
    }

    #[test]
    fn slow_velocity_is_untouched() {
        assert_eq!(clamp_speed(Vec2::new(60.0, 80.0), 100.0), None);
        assert_eq!(clamp_speed(Vec2::zero(), 100.0), None);
    }

    #[test]
    fn spin_keeps_its_sign() {
        assert_eq!(clamp_angular_speed(-9.0, 6.0), Some(-6.0));
        assert_eq!(clamp_angular_speed(7.5, 6.0), Some(6.0));
        assert_eq!(clamp_angular_speed(6.0, 6.0), None);
    }

    #[test]
    fn non_finite_motion_is_zeroed() {
        assert_eq!(clamp_speed(Vec2::new(f32::NAN, 1.0), 100.0), Some(Vec2::zero()));
        assert_eq!(clamp_speed(Vec2::new(0.0, f32::INFINITY), 100.0), Some(Vec2::zero()));
        assert_eq!(clamp_angular_speed(f32::NAN, 6.0), Some(0.0));
        assert_eq!(clamp_angular_speed(f32::NEG_INFINITY, 6.0), Some(0.0));
    }

    #[test]
    fn huge_finite_velocity_still_reaches_the_ceiling() {
        let v = clamp_speed(Vec2::new(f32::MAX, f32::MAX), 100.0).unwrap();
        assert!((v.length() - 100.0).abs() < 1e-3, "{:?}", v);
        assert!((v.x - v.y).abs() < 1e-4);
    }
}
