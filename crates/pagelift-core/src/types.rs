// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagelift image engine.

use serde::{Deserialize, Serialize};

/// Lowest and highest accepted values for the manual brightness and contrast knobs.
pub const FILTER_MIN: i32 = -100;
pub const FILTER_MAX: i32 = 100;

/// Automatic corrections applied by the enhancement pass.
///
/// All flags default to `false`, in which case enhancement leaves pixel data
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnhancementOptions {
    /// Push bright pixels towards white.
    pub white_background: bool,
    /// Lift every channel by a flat offset.
    pub remove_shadows: bool,
    /// Apply a mild fixed contrast boost in a second pass.
    pub boost_clarity: bool,
}

impl EnhancementOptions {
    /// True when no correction is requested.
    pub fn is_noop(&self) -> bool {
        !(self.white_background || self.remove_shadows || self.boost_clarity)
    }
}

/// Manual adjustments chosen by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterOptions {
    /// Brightness offset, -100..=100.
    pub brightness: i32,
    /// Contrast level, -100..=100.
    pub contrast: i32,
    /// Collapse colour to luminance.
    pub black_and_white: bool,
}

impl FilterOptions {
    /// Copy with brightness and contrast clamped into their valid domain.
    pub fn clamped(self) -> Self {
        Self {
            brightness: self.brightness.clamp(FILTER_MIN, FILTER_MAX),
            contrast: self.contrast.clamp(FILTER_MIN, FILTER_MAX),
            black_and_white: self.black_and_white,
        }
    }

    /// True when the filter pass would leave every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        let c = self.clamped();
        c.brightness == 0 && c.contrast == 0 && !c.black_and_white
    }
}

/// An integer pixel coordinate. May lie outside the image when supplied by a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Corner {
    pub x: i32,
    pub y: i32,
}

impl Corner {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in pixel space, `x`/`y` inclusive, `x + width`/`y + height` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    /// Bounding box of a set of corners. `None` for an empty slice.
    pub fn bounding(corners: &[Corner]) -> Option<Self> {
        let first = corners.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for c in &corners[1..] {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x as i64 - min_x as i64,
            height: max_y as i64 - min_y as i64,
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// The four corners ordered top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Corner; 4] {
        let right = (self.x as i64 + self.width) as i32;
        let bottom = (self.y as i64 + self.height) as i32;
        [
            Corner::new(self.x, self.y),
            Corner::new(right, self.y),
            Corner::new(right, bottom),
            Corner::new(self.x, bottom),
        ]
    }
}

/// Encoded raster formats the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// MIME type string used in data URLs.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Parse a MIME type as it appears in a data URL header.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Infer format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Margin kept clear on every side of an assembled PDF page.
pub const PAGE_MARGIN_MM: u32 = 15;

/// Standard paper sizes for PDF page assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// True when both sides leave room for content inside the page margins.
    pub fn fits_margins(&self) -> bool {
        let (width, height) = self.dimensions_mm();
        width > 2 * PAGE_MARGIN_MM && height > 2 * PAGE_MARGIN_MM
    }

    /// Parse a paper size name as typed on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "a3" => Some(Self::A3),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            _ => None,
        }
    }
}
