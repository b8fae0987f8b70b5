// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PageliftError, Result};

/// Encoder qualities and output sizes used by the image engine.
///
/// Missing fields in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// JPEG quality (1-100) for full-size enhancement, filter, and crop output.
    pub jpeg_quality: u8,
    /// JPEG quality for thumbnails.
    pub thumbnail_quality: u8,
    /// JPEG quality for PDF page images.
    pub pdf_quality: u8,
    /// Default maximum thumbnail width in pixels.
    pub thumbnail_max_width: u32,
    /// Default maximum PDF page image width in pixels.
    pub pdf_max_width: u32,
    /// Maximum width of the image handed to the OCR service.
    pub ocr_max_width: u32,
    /// Paper size for assembled PDFs.
    pub paper_size: crate::PaperSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 92,
            thumbnail_quality: 60,
            pdf_quality: 85,
            thumbnail_max_width: 150,
            pdf_max_width: 1200,
            ocr_max_width: 1600,
            paper_size: crate::PaperSize::A4,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject qualities outside 1..=100, zero widths, and paper too small for
    /// the page margins.
    pub fn validate(&self) -> Result<()> {
        for (name, quality) in [
            ("jpeg_quality", self.jpeg_quality),
            ("thumbnail_quality", self.thumbnail_quality),
            ("pdf_quality", self.pdf_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(PageliftError::Config(format!(
                    "{name} must be between 1 and 100, got {quality}"
                )));
            }
        }
        for (name, width) in [
            ("thumbnail_max_width", self.thumbnail_max_width),
            ("pdf_max_width", self.pdf_max_width),
            ("ocr_max_width", self.ocr_max_width),
        ] {
            if width == 0 {
                return Err(PageliftError::Config(format!("{name} must be non-zero")));
            }
        }
        if !self.paper_size.fits_margins() {
            let (width_mm, height_mm) = self.paper_size.dimensions_mm();
            return Err(PageliftError::Config(format!(
                "paper_size {width_mm}x{height_mm} mm must exceed {} mm on each side",
                2 * crate::PAGE_MARGIN_MM
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.jpeg_quality, 92);
        assert_eq!(config.thumbnail_max_width, 150);
        assert_eq!(config.pdf_max_width, 1200);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagelift.json");
        std::fs::write(&path, r#"{ "pdf_quality": 70, "paper_size": "Letter" }"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.pdf_quality, 70);
        assert_eq!(config.paper_size, crate::PaperSize::Letter);
        assert_eq!(config.thumbnail_quality, 60);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = EngineConfig {
            ocr_max_width: 2000,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "jpeg_quality": 0 }"#).unwrap();

        match EngineConfig::load(&path) {
            Err(PageliftError::Config(msg)) => assert!(msg.contains("jpeg_quality")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn paper_smaller_than_margins_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        std::fs::write(
            &path,
            r#"{ "paper_size": { "Custom": { "width_mm": 20, "height_mm": 20 } } }"#,
        )
        .unwrap();

        match EngineConfig::load(&path) {
            Err(PageliftError::Config(msg)) => assert!(msg.contains("paper_size")),
            other => panic!("expected Config error, got {other:?}"),
        }

        let wide_enough = EngineConfig {
            paper_size: crate::PaperSize::Custom {
                width_mm: 100,
                height_mm: 150,
            },
            ..Default::default()
        };
        assert!(wide_enough.validate().is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineConfig::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(PageliftError::Io(_))));
    }
}
