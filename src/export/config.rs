use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::export::error::ExportError;

/// A4 portrait, millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Tunables for one export run. Lengths share the page's unit (millimetres for PDF output).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Cards processed before each cooperative pause.
    pub batch_size: usize,
    pub page_width: f32,
    pub page_height: f32,
    /// Left and top margin used when a page or row starts.
    pub margin: f32,
    pub card_width: f32,
    pub card_height: f32,
    pub horizontal_advance: f32,
    pub vertical_advance: f32,
    /// Resolution multiplier applied when rasterising a card face.
    pub raster_scale: f32,
    /// Lossy compression factor in `(0, 1]`.
    pub image_quality: f32,
    /// RGB colour the card face is flattened onto.
    pub background: [u8; 3],
    /// Largest pixel count a single rasterised card may have.
    pub max_raster_pixels: u64,
    pub inter_batch_delay_ms: u64,
    pub finalize_delay_ms: u64,
    /// Share of cards allowed to fail before the whole export is abandoned.
    pub max_failure_ratio: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            page_width: A4_WIDTH_MM,
            page_height: A4_HEIGHT_MM,
            margin: 10.0,
            card_width: 90.0,
            card_height: 130.0,
            horizontal_advance: 100.0,
            vertical_advance: 140.0,
            raster_scale: 1.5,
            image_quality: 0.8,
            background: [255, 255, 255],
            max_raster_pixels: 16_777_216,
            inter_batch_delay_ms: 100,
            finalize_delay_ms: 200,
            max_failure_ratio: 0.5,
        }
    }
}

impl ExportConfig {
    /// Read a JSON config file; missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: ExportConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Same layout with the cooperative pauses removed.
    pub fn without_delays(mut self) -> Self {
        self.inter_batch_delay_ms = 0;
        self.finalize_delay_ms = 0;
        self
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        let invalid = |msg: String| Err(ExportError::InvalidConfig(msg));
        if self.batch_size == 0 {
            return invalid("batch size must be at least 1".to_string());
        }
        for (name, value) in [
            ("page width", self.page_width),
            ("page height", self.page_height),
            ("card width", self.card_width),
            ("card height", self.card_height),
            ("horizontal advance", self.horizontal_advance),
            ("vertical advance", self.vertical_advance),
            ("raster scale", self.raster_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{} must be positive, got {}", name, value));
            }
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return invalid(format!("margin must be non-negative, got {}", self.margin));
        }
        if !(self.image_quality > 0.0 && self.image_quality <= 1.0) {
            return invalid(format!(
                "image quality must be within (0, 1], got {}",
                self.image_quality
            ));
        }
        if !(0.0..=1.0).contains(&self.max_failure_ratio) {
            return invalid(format!(
                "failure ratio must be within [0, 1], got {}",
                self.max_failure_ratio
            ));
        }
        if self.margin + self.card_width > self.page_width
            || self.margin + self.card_height > self.page_height
        {
            return invalid(format!(
                "a {}x{} card does not fit a {}x{} page with margin {}",
                self.card_width, self.card_height, self.page_width, self.page_height, self.margin
            ));
        }
        Ok(())
    }

    /// Cards that fit on one page under this layout.
    pub fn cards_per_page(&self) -> usize {
        let per_row = 1 + ((self.page_width - self.margin - self.card_width)
            / self.horizontal_advance)
            .floor()
            .max(0.0) as usize;
        let rows = 1 + ((self.page_height - self.margin - self.card_height)
            / self.vertical_advance)
            .floor()
            .max(0.0) as usize;
        per_row * rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fit_four_cards_per_a4_page() {
        let config = ExportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cards_per_page(), 4);
    }

    #[test]
    fn rejects_broken_layouts() {
        let zero_batch = ExportConfig {
            batch_size: 0,
            ..ExportConfig::default()
        };
        assert!(matches!(
            zero_batch.validate(),
            Err(ExportError::InvalidConfig(_))
        ));

        let oversized = ExportConfig {
            card_height: 300.0,
            ..ExportConfig::default()
        };
        assert!(oversized.validate().is_err());

        let lossless = ExportConfig {
            image_quality: 1.5,
            ..ExportConfig::default()
        };
        assert!(lossless.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{ "batch_size": 25, "raster_scale": 2.0 }"#).expect("parse");
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.raster_scale, 2.0);
        assert_eq!(config.card_width, 90.0);
        assert_eq!(config.without_delays().inter_batch_delay_ms, 0);
    }
}
