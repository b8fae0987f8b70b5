// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Border detection and bounding-box cropping.
//
// Detection samples a coarse grid for non-background pixels, then pads the
// content box. Cropping takes the axis-aligned bounding box of whatever
// corners the caller supplies; no perspective warp is applied.

use image::{DynamicImage, RgbaImage, imageops};
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::{Corner, PixelRect};
use tracing::{debug, info, instrument, warn};

/// Sampling stride in both axes.
pub const SAMPLE_STRIDE: u32 = 20;
/// Samples whose channel sum is below this (mean brightness < 240) count as content.
const CONTENT_SUM_LIMIT: u32 = 240 * 3;
/// Padding added to every side of the content box.
pub const BORDER_PADDING: i32 = 10;
/// Largest crop the engine will allocate, in pixels.
const MAX_CROP_PIXELS: u64 = 1 << 28;

/// Result of border detection: the padded content rectangle and the decoded
/// raster it was measured on, so the caller can crop without decoding again.
#[derive(Debug, Clone)]
pub struct BorderDetection {
    /// Top-left, top-right, bottom-right, bottom-left.
    pub corners: [Corner; 4],
    /// The decoded source raster.
    pub image: DynamicImage,
    /// False when no sample qualified as content and the full frame was used.
    pub content_found: bool,
}

impl BorderDetection {
    /// The detected rectangle.
    pub fn bounds(&self) -> PixelRect {
        // Four corners always produce a rectangle.
        PixelRect::bounding(&self.corners).unwrap_or(PixelRect {
            x: 0,
            y: 0,
            width: self.image.width() as i64,
            height: self.image.height() as i64,
        })
    }

    /// Crop the decoded raster to the detected rectangle.
    pub fn crop(&self) -> Result<DynamicImage> {
        crop(&self.image, &self.corners)
    }
}

/// Estimate the document area of `image`.
///
/// A frame with no content samples (e.g. a blank white page) yields the full
/// image bounds rather than an error. A zero-sized raster is rejected.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn detect_borders(image: DynamicImage) -> Result<BorderDetection> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PageliftError::DegenerateGeometry {
            width: width as i64,
            height: height as i64,
        });
    }

    let rgba = image.to_rgba8();
    let (rect, content_found) = match content_bounds(&rgba) {
        Some(raw) => {
            debug!(
                min_x = raw.x,
                min_y = raw.y,
                max_x = raw.x as i64 + raw.width,
                max_y = raw.y as i64 + raw.height,
                "Raw content box"
            );
            (pad_and_clamp(raw, width, height), true)
        }
        None => {
            warn!("No content samples found; using full image bounds");
            (
                PixelRect {
                    x: 0,
                    y: 0,
                    width: width as i64,
                    height: height as i64,
                },
                false,
            )
        }
    };

    let corners = rect.corners();
    info!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "Borders detected"
    );

    Ok(BorderDetection {
        corners,
        image,
        content_found,
    })
}

/// Bounding box of the sampled content points, before padding.
///
/// `width`/`height` are the distances between the extreme samples, so a
/// single content sample yields a zero-sized box at that point.
pub fn content_bounds(rgba: &RgbaImage) -> Option<PixelRect> {
    let (width, height) = rgba.dimensions();
    let mut extent: Option<(u32, u32, u32, u32)> = None;

    for y in (0..height).step_by(SAMPLE_STRIDE as usize) {
        for x in (0..width).step_by(SAMPLE_STRIDE as usize) {
            let [r, g, b, _] = rgba.get_pixel(x, y).0;
            if (r as u32 + g as u32 + b as u32) >= CONTENT_SUM_LIMIT {
                continue;
            }
            extent = Some(match extent {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        }
    }

    extent.map(|(min_x, min_y, max_x, max_y)| PixelRect {
        x: min_x as i32,
        y: min_y as i32,
        width: (max_x - min_x) as i64,
        height: (max_y - min_y) as i64,
    })
}

/// Grow a raw content box by [`BORDER_PADDING`] per side, clamped to the image.
fn pad_and_clamp(raw: PixelRect, width: u32, height: u32) -> PixelRect {
    let pad = BORDER_PADDING as i64;
    let left = (raw.x as i64 - pad).max(0);
    let top = (raw.y as i64 - pad).max(0);
    let right = (raw.x as i64 + raw.width + pad).min(width as i64);
    let bottom = (raw.y as i64 + raw.height + pad).min(height as i64);
    PixelRect {
        x: left as i32,
        y: top as i32,
        width: right - left,
        height: bottom - top,
    }
}

/// Cut the axis-aligned bounding box of `corners` out of `image`.
///
/// The result is exactly `max(x)-min(x)` by `max(y)-min(y)`. Any part of the
/// box outside the source stays transparent.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn crop(image: &DynamicImage, corners: &[Corner]) -> Result<DynamicImage> {
    let rect = PixelRect::bounding(corners)
        .ok_or(PageliftError::DegenerateGeometry { width: 0, height: 0 })?;
    if rect.is_degenerate() {
        return Err(PageliftError::DegenerateGeometry {
            width: rect.width,
            height: rect.height,
        });
    }
    if rect.width as u64 * rect.height as u64 > MAX_CROP_PIXELS {
        return Err(PageliftError::Encode(format!(
            "crop of {}x{} exceeds the allocation limit",
            rect.width, rect.height
        )));
    }

    let (out_w, out_h) = (rect.width as u32, rect.height as u32);
    let (src_w, src_h) = (image.width() as i64, image.height() as i64);

    // Fast path: box fully inside the source.
    if rect.x >= 0
        && rect.y >= 0
        && rect.x as i64 + rect.width <= src_w
        && rect.y as i64 + rect.height <= src_h
    {
        debug!(x = rect.x, y = rect.y, out_w, out_h, "Cropping inside bounds");
        let cropped = image.crop_imm(rect.x as u32, rect.y as u32, out_w, out_h);
        return Ok(DynamicImage::ImageRgba8(cropped.to_rgba8()));
    }

    let mut output = RgbaImage::new(out_w, out_h);
    let left = (rect.x as i64).max(0);
    let top = (rect.y as i64).max(0);
    let right = (rect.x as i64 + rect.width).min(src_w);
    let bottom = (rect.y as i64 + rect.height).min(src_h);

    if right > left && bottom > top {
        let visible = image
            .crop_imm(
                left as u32,
                top as u32,
                (right - left) as u32,
                (bottom - top) as u32,
            )
            .to_rgba8();
        imageops::replace(
            &mut output,
            &visible,
            left - rect.x as i64,
            top - rect.y as i64,
        );
    } else {
        warn!("Crop box lies entirely outside the image");
    }

    debug!(out_w, out_h, "Cropped with transparent fill");
    Ok(DynamicImage::ImageRgba8(output))
}

/// Detect borders and crop in one step.
pub fn auto_crop(image: DynamicImage) -> Result<DynamicImage> {
    detect_borders(image)?.crop()
}
