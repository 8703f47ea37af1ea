//! Library-rendered preview configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the in-process SVG preview renderer.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Edge length of the square canvas in pixels.
    #[validate(range(min = 16, max = 8192))]
    pub canvas_size: u32,
    /// Maximum chord deviation when flattening curves, relative to radius.
    #[validate(range(min = 0.000001, max = 0.5))]
    pub tolerance: f64,
    /// Stroke width in canvas pixels.
    #[validate(range(min = 0.01, max = 64.0))]
    pub stroke_width: f64,
    /// Stroke color as an SVG paint value.
    pub stroke_color: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            canvas_size: 512,
            tolerance: 0.002,
            stroke_width: 1.0,
            stroke_color: "#000000".to_string(),
        }
    }
}
