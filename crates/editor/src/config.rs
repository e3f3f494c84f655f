//! Editor configuration

use serde::{Deserialize, Serialize};

use crate::{EditorError, Result};

/// RGB color (components 0.0 - 1.0)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Convert to the PDF layer's color type
    pub fn to_pdf(self) -> pdf_core::Color {
        pdf_core::Color::rgb(self.r as f32, self.g as f32, self.b as f32)
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::black()
    }
}

/// How the page previews are stacked in the scrollable editing surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Space between the container edge and the pages (px)
    pub padding: f64,
    /// Vertical gap between consecutive pages (px)
    pub page_gap: f64,
    /// Display zoom applied on top of the render scale
    pub zoom: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: 16.0,
            page_gap: 2.0,
            zoom: 1.0,
        }
    }
}

/// Editor settings
///
/// Every field has a default, so a partial JSON object is enough:
///
/// ```ignore
/// let config = EditorConfig::from_json(r#"{ "min_redaction_size": 8 }"#)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Render scale for the sign/edit/redact surfaces
    pub edit_render_scale: f64,
    /// Render scale for organizer thumbnails
    pub organize_render_scale: f64,
    /// Redaction drags smaller than this in either dimension are dropped (px)
    pub min_redaction_size: f64,
    /// Initial width of image and signature overlays (px)
    pub image_overlay_width: f64,
    /// Pre-rendered text bitmaps are placed at this fraction of their width
    pub text_overlay_ratio: f64,
    /// Fill color for redactions
    pub redaction_color: RgbColor,
    pub layout: LayoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            edit_render_scale: 1.5,
            organize_render_scale: 0.5,
            min_redaction_size: 5.0,
            image_overlay_width: 150.0,
            text_overlay_ratio: 0.5,
            redaction_color: RgbColor::black(),
            layout: LayoutConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all scales and sizes are usable
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("edit_render_scale", self.edit_render_scale),
            ("organize_render_scale", self.organize_render_scale),
            ("image_overlay_width", self.image_overlay_width),
            ("text_overlay_ratio", self.text_overlay_ratio),
            ("layout.zoom", self.layout.zoom),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EditorError::ConfigError(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("min_redaction_size", self.min_redaction_size),
            ("layout.padding", self.layout.padding),
            ("layout.page_gap", self.layout.page_gap),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EditorError::ConfigError(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        Ok(())
    }
}
