//! Configuration for creature assembly.
//!
//! Every tuning constant of the generator lives here so it can be changed
//! without touching the assembly code. Files are JSON; missing fields fall
//! back to the defaults.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range of real values drawn uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform draw in `[min, max]`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        // gen_range panics when the span itself overflows.
        let span = self.max - self.min;
        if !span.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidRange { name, min: self.min, max: self.max });
        }
        Ok(())
    }
}

/// Ranges for a box-shaped segment's width, height and depth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxRanges {
    pub width: FloatRange,
    pub height: FloatRange,
    pub depth: FloatRange,
}

/// Parameters for the generated torso.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TorsoConfig {
    /// Raw draw ranges before the minimum clamp.
    pub ranges: BoxRanges,
    /// Lower bounds applied after the draw (width, height, depth).
    pub min_width: f32,
    pub min_height: f32,
    pub min_depth: f32,
}

impl Default for TorsoConfig {
    fn default() -> Self {
        Self {
            ranges: BoxRanges {
                width: FloatRange::new(0.5, 1.5),
                height: FloatRange::new(0.5, 1.5),
                depth: FloatRange::new(0.5, 1.5),
            },
            min_width: 1.0,
            min_height: 1.2,
            min_depth: 1.0,
        }
    }
}

/// Motor drawn for every hinge joint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Maximum force the motor may apply.
    pub force: FloatRange,
    /// Target angular velocity in degrees per second.
    pub target_velocity: FloatRange,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            force: FloatRange::new(100.0, 200.0),
            target_velocity: FloatRange::new(-100.0, 100.0),
        }
    }
}

/// Configuration parameters for creature assembly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub torso: TorsoConfig,

    /// Head side length as a fraction of torso width (default: 0.5).
    pub head_scale: f32,

    /// Explicit head mass; every other segment keeps the engine default.
    pub head_mass: f32,

    /// Ranges shared by upper and lower limb segments.
    pub limb: BoxRanges,

    pub motor: MotorConfig,

    /// A lower limb is added when a [0, 1) draw exceeds this value.
    pub lower_limb_threshold: f32,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            torso: TorsoConfig::default(),
            head_scale: 0.5,
            head_mass: 1.0,
            limb: BoxRanges {
                width: FloatRange::new(0.1, 0.3),
                height: FloatRange::new(0.5, 1.5),
                depth: FloatRange::new(0.1, 0.3),
            },
            motor: MotorConfig::default(),
            lower_limb_threshold: 0.7,
        }
    }
}

impl AssemblyConfig {
    /// Load a config from a JSON file. Fields absent from the file keep
    /// their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Probability that a limb chain grows a lower segment.
    pub fn lower_limb_probability(&self) -> f32 {
        (1.0 - self.lower_limb_threshold).clamp(0.0, 1.0)
    }

    /// Reject configurations the generator cannot sample from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.torso;
        t.ranges.width.check("torso.ranges.width")?;
        t.ranges.height.check("torso.ranges.height")?;
        t.ranges.depth.check("torso.ranges.depth")?;
        FloatRange::new(t.min_width, t.ranges.width.max).check("torso.min_width")?;
        FloatRange::new(t.min_height, t.ranges.height.max).check("torso.min_height")?;
        FloatRange::new(t.min_depth, t.ranges.depth.max).check("torso.min_depth")?;

        self.limb.width.check("limb.width")?;
        self.limb.height.check("limb.height")?;
        self.limb.depth.check("limb.depth")?;
        self.motor.force.check("motor.force")?;
        self.motor.target_velocity.check("motor.target_velocity")?;

        for (name, min) in [
            ("torso.min_width", t.min_width),
            ("torso.min_height", t.min_height),
            ("torso.min_depth", t.min_depth),
            ("limb.width", self.limb.width.min),
            ("limb.height", self.limb.height.min),
            ("limb.depth", self.limb.depth.min),
        ] {
            if min <= 0.0 {
                return Err(ConfigError::NonPositive { name, value: min });
            }
        }
        for (name, value) in [("head_scale", self.head_scale), ("head_mass", self.head_mass)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.lower_limb_threshold) {
            return Err(ConfigError::InvalidThreshold(self.lower_limb_threshold));
        }
        Ok(())
    }
}

/// Errors raised while loading or validating a config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid range for {name}: [{min}, {max}]")]
    InvalidRange { name: &'static str, min: f32, max: f32 },

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("lower limb threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f32),
}
