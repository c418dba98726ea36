//! Per-job print options.

use serde::{Deserialize, Serialize};

use crate::transform::Rotation;

pub const DEFAULT_FONT_SIZE: i32 = 24;
pub const DEFAULT_MARGIN: i32 = 10;
pub const DEFAULT_DPI: i32 = 300;

/// Largest accepted option values.
pub const MAX_FONT_SIZE: i32 = 500;
pub const MAX_MARGIN: i32 = 1000;
pub const MAX_DPI: i32 = 600;

/// Options accepted alongside every print payload.
///
/// Missing fields take their defaults. `rotate` accepts 0/90/180/270; any
/// other value is treated as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintOptions {
    /// Font size in pixels (text labels only)
    pub font_size: i32,
    /// Counter-clockwise rotation in degrees
    #[serde(alias = "rotation")]
    pub rotate: i32,
    /// Cut after each label
    pub cut: bool,
    /// White border in pixels
    pub margin: i32,
    /// Rasterization resolution (documents only)
    pub dpi: i32,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            rotate: 0,
            cut: true,
            margin: DEFAULT_MARGIN,
            dpi: DEFAULT_DPI,
        }
    }
}

impl PrintOptions {
    /// Check value ranges. Rotation is never rejected.
    pub fn validate(&self) -> Result<(), String> {
        if self.font_size <= 0 {
            return Err(format!("font_size must be positive, got {}", self.font_size));
        }
        if self.font_size > MAX_FONT_SIZE {
            return Err(format!("font_size must be at most {}, got {}", MAX_FONT_SIZE, self.font_size));
        }
        if self.margin < 0 {
            return Err(format!("margin must not be negative, got {}", self.margin));
        }
        if self.margin > MAX_MARGIN {
            return Err(format!("margin must be at most {}, got {}", MAX_MARGIN, self.margin));
        }
        if self.dpi <= 0 {
            return Err(format!("dpi must be positive, got {}", self.dpi));
        }
        if self.dpi > MAX_DPI {
            return Err(format!("dpi must be at most {}, got {}", MAX_DPI, self.dpi));
        }
        Ok(())
    }

    pub fn rotation(&self) -> Rotation {
        Rotation::from_degrees(self.rotate)
    }

    /// Margin in pixels; negative values clamp to 0.
    pub fn margin_px(&self) -> u32 {
        self.margin.max(0) as u32
    }

    pub fn font_size_px(&self) -> u32 {
        self.font_size.max(1) as u32
    }

    pub fn dpi_value(&self) -> u32 {
        self.dpi.max(1) as u32
    }
}
