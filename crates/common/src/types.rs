use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 24-bit RGB color packed as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Largest representable color.
    pub const MAX: u32 = 0xFF_FFFF;
    pub const WHITE: Rgb = Rgb(0xFF_FFFF);

    pub fn from_components(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn components(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    /// Linear-ish float components in `[0, 1]`, with alpha 1.
    pub fn to_rgba_f32(self) -> [f32; 4] {
        let [r, g, b] = self.components();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }
}

/// Errors from parsing a `#rrggbb` color string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("expected 6 hex digits, got {0:?}")]
    BadLength(String),
    #[error("invalid hex color {0:?}")]
    BadDigit(String),
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#').trim_start_matches("0x");
        if hex.len() != 6 {
            return Err(ColorParseError::BadLength(s.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb)
            .map_err(|_| ColorParseError::BadDigit(s.to_string()))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Live spatial transform: position plus XYZ Euler rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }
}

/// Rectangular ground-plane footprint centred on the origin.
///
/// `width` spans X and `depth` spans Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneBounds {
    pub width: f32,
    pub depth: f32,
}

impl PlaneBounds {
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }

    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    pub fn half_depth(&self) -> f32 {
        self.depth / 2.0
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.depth.is_finite() && self.width > 0.0 && self.depth > 0.0
    }

    /// True if `(x, z)` lies inside the footprint, edges included.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x.abs() <= self.half_width() && z.abs() <= self.half_depth()
    }
}

impl Default for PlaneBounds {
    fn default() -> Self {
        Self::new(600.0, 400.0)
    }
}
