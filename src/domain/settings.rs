use std::fmt;

use serde::Deserialize;

use super::color::Rgb;

/// Inclusive bounds on how many tiles an image is cut into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct TileCountRange {
    pub min: u32,
    pub max: u32,
}

/// Largest tile count a settings payload may ask for.
pub const MAX_TILE_COUNT: u32 = 1024;

impl TileCountRange {
    pub const DEFAULT: TileCountRange = TileCountRange { min: 40, max: 160 };
    /// Tighter variant used for large captures where a coarse grid looks blocky.
    pub const DENSE: TileCountRange = TileCountRange { min: 96, max: 160 };

    pub fn midpoint(&self) -> f64 {
        (self.min as f64 + self.max as f64) / 2.0
    }

    pub fn contains(&self, count: u32) -> bool {
        count >= self.min && count <= self.max
    }
}

impl Default for TileCountRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct GravitySetting {
    pub x: f32,
    pub y: f32,
}

/// Tunables for world construction and per-frame governance.
///
/// Units: pixels, seconds for rates (px/s, rad/s), milliseconds for frame steps.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationSettings {
    pub tile_count: TileCountRange,
    /// Gap between the tile field and the container walls on every side.
    pub container_padding: f32,
    /// Walls grow outward from the container boundary by this much.
    pub wall_thickness: f32,
    pub position_jitter: f32,
    pub initial_speed_max: f32,
    pub initial_angular_speed_max: f32,
    pub gravity: GravitySetting,
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    /// Tangential acceleration (px/s² per radian of knob rotation) at radius factor 1.
    pub mixing_strength: f32,
    pub mixing_epsilon: f32,
    pub max_radius_factor: f32,
    pub max_speed: f32,
    pub max_angular_speed: f32,
    pub max_frame_step_ms: f32,
    pub outline_color: String,
    pub fallback_color: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tile_count: TileCountRange::DEFAULT,
            container_padding: 40.0,
            wall_thickness: 60.0,
            position_jitter: 14.0,
            initial_speed_max: 90.0,
            initial_angular_speed_max: 1.5,
            gravity: GravitySetting { x: 0.0, y: 1000.0 },
            restitution: 0.35,
            friction: 0.2,
            density: 0.001,
            mixing_strength: 120_000.0,
            mixing_epsilon: 1e-4,
            max_radius_factor: 1.5,
            max_speed: 900.0,
            max_angular_speed: 6.0,
            max_frame_step_ms: 1000.0 / 30.0,
            outline_color: "#ffffff".to_string(),
            fallback_color: "#333333".to_string(),
        }
    }
}

impl SimulationSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: SimulationSettings =
            serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let range = self.tile_count;
        if range.min < 4 || range.min > range.max || range.max > MAX_TILE_COUNT {
            return Err(SettingsError::TileCountRange { min: range.min, max: range.max });
        }

        let positive = [
            ("containerPadding", self.container_padding),
            ("wallThickness", self.wall_thickness),
            ("density", self.density),
            ("maxRadiusFactor", self.max_radius_factor),
            ("maxSpeed", self.max_speed),
            ("maxAngularSpeed", self.max_angular_speed),
            ("maxFrameStepMs", self.max_frame_step_ms),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::NotPositive(name));
            }
        }

        let non_negative = [
            ("positionJitter", self.position_jitter),
            ("initialSpeedMax", self.initial_speed_max),
            ("initialAngularSpeedMax", self.initial_angular_speed_max),
            ("restitution", self.restitution),
            ("friction", self.friction),
            ("mixingStrength", self.mixing_strength),
            ("mixingEpsilon", self.mixing_epsilon),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::Negative(name));
            }
        }

        if self.position_jitter >= self.container_padding {
            return Err(SettingsError::JitterExceedsPadding {
                jitter: self.position_jitter,
                padding: self.container_padding,
            });
        }

        self.outline_rgb()?;
        self.fallback_rgb()?;
        Ok(())
    }

    pub fn outline_rgb(&self) -> Result<Rgb, SettingsError> {
        Rgb::from_hex(&self.outline_color)
            .ok_or_else(|| SettingsError::Color(self.outline_color.clone()))
    }

    pub fn fallback_rgb(&self) -> Result<Rgb, SettingsError> {
        Rgb::from_hex(&self.fallback_color)
            .ok_or_else(|| SettingsError::Color(self.fallback_color.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    Parse(String),
    TileCountRange { min: u32, max: u32 },
    NotPositive(&'static str),
    Negative(&'static str),
    /// Jitter at or beyond the padding could spawn tiles inside a wall.
    JitterExceedsPadding { jitter: f32, padding: f32 },
    Color(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Parse(msg) => write!(f, "Invalid settings JSON: {}", msg),
            SettingsError::TileCountRange { min, max } => {
                write!(
                    f,
                    "Invalid tile count range {}..={} (need 4 <= min <= max <= {})",
                    min, max, MAX_TILE_COUNT
                )
            }
            SettingsError::NotPositive(name) => write!(f, "Setting '{}' must be positive", name),
            SettingsError::Negative(name) => write!(f, "Setting '{}' must not be negative", name),
            SettingsError::JitterExceedsPadding { jitter, padding } => write!(
                f,
                "Position jitter {} must be smaller than container padding {}",
                jitter, padding
            ),
            SettingsError::Color(value) => write!(f, "Invalid colour '{}', expected #rrggbb", value),
        }
    }
}

impl std::error::Error for SettingsError {}
