use cubefield_common::PlaneBounds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Where a freshly sampled particle sits vertically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YPolicy {
    /// `y = height / 2`: the box rests on the ground plane.
    Resting,
    /// `y ~ uniform[0, ceiling)`, independent of the box's own height.
    Floating { ceiling: f32 },
}

/// How the expand slider maps onto live positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Live position is recomputed as `base * factor` on every change.
    #[default]
    Canonical,
    /// Multiply when the factor rose since the last call, divide otherwise.
    /// Path dependent; kept for visual parity with the old demo.
    Toggle,
}

/// Named configuration presets for the two demo layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProfile {
    #[default]
    Resting,
    Floating,
}

impl FieldProfile {
    pub const ALL: [FieldProfile; 2] = [FieldProfile::Resting, FieldProfile::Floating];

    pub fn name(self) -> &'static str {
        match self {
            Self::Resting => "resting",
            Self::Floating => "floating",
        }
    }
}

impl fmt::Display for FieldProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownProfile(s.to_string()))
    }
}

/// Errors from building or loading a field configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("batch size must be positive")]
    InvalidBatchSize,
    #[error("plane bounds must be positive and finite, got {width} x {depth}")]
    InvalidPlaneBounds { width: f32, depth: f32 },
    #[error("floating ceiling must be positive and finite, got {0}")]
    InvalidCeiling(f32),
    #[error("vertical scale must be positive and finite, got {0}")]
    InvalidVerticalScale(f32),
    #[error("unknown profile {0:?} (expected resting or floating)")]
    UnknownProfile(String),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Parameters of the particle field generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Ground footprint that bounds x and z of every sampled particle.
    pub plane: PlaneBounds,
    /// Particles appended per batch.
    pub batch_size: usize,
    /// Field length at which automatic growth stops.
    pub cap: usize,
    pub y_policy: YPolicy,
    /// Extra multiplier applied to y when scaling.
    pub vertical_scale: f32,
    pub scale_mode: ScaleMode,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::profile(FieldProfile::Resting)
    }
}

impl FieldConfig {
    pub const DEFAULT_BATCH_SIZE: usize = 100;
    pub const DEFAULT_CAP: usize = 1000;
    pub const FLOATING_CEILING: f32 = 100.0;

    /// Build one of the named presets.
    pub fn profile(profile: FieldProfile) -> Self {
        let (y_policy, vertical_scale) = match profile {
            FieldProfile::Resting => (YPolicy::Resting, 1.0),
            FieldProfile::Floating => (
                YPolicy::Floating {
                    ceiling: Self::FLOATING_CEILING,
                },
                1.01,
            ),
        };
        Self {
            plane: PlaneBounds::default(),
            batch_size: Self::DEFAULT_BATCH_SIZE,
            cap: Self::DEFAULT_CAP,
            y_policy,
            vertical_scale,
            scale_mode: ScaleMode::default(),
        }
    }

    /// Fail fast on values the generator cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if !self.plane.is_valid() {
            return Err(ConfigError::InvalidPlaneBounds {
                width: self.plane.width,
                depth: self.plane.depth,
            });
        }
        if let YPolicy::Floating { ceiling } = self.y_policy {
            if !(ceiling.is_finite() && ceiling > 0.0) {
                return Err(ConfigError::InvalidCeiling(ceiling));
            }
        }
        if !(self.vertical_scale.is_finite() && self.vertical_scale > 0.0) {
            return Err(ConfigError::InvalidVerticalScale(self.vertical_scale));
        }
        Ok(())
    }

    /// Parse a YAML document and validate it. Missing keys fall back to the
    /// resting profile.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded field config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
