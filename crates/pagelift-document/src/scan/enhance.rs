// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — automatic background/shadow/clarity correction,
// manual brightness/contrast/black-and-white filters, and binarization for
// OCR preprocessing.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::contrast::otsu_level;
use pagelift_core::error::Result;
use pagelift_core::{EnhancementOptions, FilterOptions};
use tracing::{debug, info, instrument};

use super::adjust::{
    BRIGHTNESS_SCALE, CLARITY_CONTRAST, SHADOW_LIFT, WHITE_PUSH_GAIN, WHITE_PUSH_THRESHOLD,
    apply_contrast, clamp_channel, contrast_factor, luminance, mean_brightness,
};
use crate::image::processor::{ImageProcessor, decode};

/// Contrast multiplier applied before adaptive binarization.
const OCR_CONTRAST: f32 = 1.4;
/// Neighbourhood radius for adaptive binarization.
const OCR_BLOCK_RADIUS: u32 = 15;
/// Offset subtracted from the local mean threshold.
const OCR_THRESHOLD_OFFSET: i32 = 10;

/// Enhances captured document images.
///
/// Every operation consumes the enhancer and returns a new one wrapping the
/// transformed raster. Alpha is never modified by the colour passes.
pub struct ScanEnhancer {
    /// The working image (kept as `DynamicImage` for flexibility).
    image: DynamicImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Create an enhancer from raw image bytes (JPEG, PNG, WebP, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = decode(data)?;
        info!(
            width = image.width(),
            height = image.height(),
            "Scan image loaded"
        );
        Ok(Self { image })
    }

    /// Create an enhancer wrapping an existing `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Borrow the current working image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the enhancer and return the underlying image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Automatic enhancement ------------------------------------------------

    /// Apply the requested automatic corrections.
    ///
    /// White push and shadow lift share one pass (white push first, so a pixel
    /// may receive both); the clarity boost runs as a second pass. With no
    /// flags set the image is returned untouched.
    #[instrument(skip(self))]
    pub fn enhance(self, options: EnhancementOptions) -> Self {
        if options.is_noop() {
            debug!("No enhancement requested");
            return self;
        }
        info!(
            white_background = options.white_background,
            remove_shadows = options.remove_shadows,
            boost_clarity = options.boost_clarity,
            "Enhancing scan"
        );

        let mut rgba = self.image.to_rgba8();

        if options.white_background || options.remove_shadows {
            for pixel in rgba.pixels_mut() {
                let [r, g, b, _] = &mut pixel.0;
                if options.white_background && mean_brightness(*r, *g, *b) > WHITE_PUSH_THRESHOLD {
                    for channel in [&mut *r, &mut *g, &mut *b] {
                        *channel = clamp_channel(*channel as f32 * WHITE_PUSH_GAIN);
                    }
                }
                if options.remove_shadows {
                    for channel in [r, g, b] {
                        *channel = clamp_channel(*channel as f32 + SHADOW_LIFT);
                    }
                }
            }
        }

        if options.boost_clarity {
            apply_contrast_pass(&mut rgba, contrast_factor(CLARITY_CONTRAST));
        }

        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    // -- Manual filters -------------------------------------------------------

    /// Apply brightness, then contrast, then optional black-and-white, in a
    /// single pass. Values outside -100..=100 are clamped first.
    ///
    /// Intermediate values are kept unclamped until the end of the pixel, so
    /// luminance sees the raw brightness/contrast outputs.
    #[instrument(skip(self))]
    pub fn apply_filters(self, options: FilterOptions) -> Self {
        let options = options.clamped();
        if options.is_identity() {
            debug!("Identity filter; image unchanged");
            return self;
        }
        info!(
            brightness = options.brightness,
            contrast = options.contrast,
            black_and_white = options.black_and_white,
            "Applying filters"
        );

        let offset = options.brightness as f32 * BRIGHTNESS_SCALE;
        let factor = contrast_factor(options.contrast as f32);

        let mut rgba = self.image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            let [r, g, b, _] = &mut pixel.0;
            let adjust = |channel: u8| apply_contrast(channel as f32 + offset, factor);
            let (mut fr, mut fg, mut fb) = (adjust(*r), adjust(*g), adjust(*b));
            if options.black_and_white {
                let luma = luminance(fr, fg, fb);
                (fr, fg, fb) = (luma, luma, luma);
            }
            *r = clamp_channel(fr);
            *g = clamp_channel(fg);
            *b = clamp_channel(fb);
        }

        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    // -- Binarization ---------------------------------------------------------

    /// Apply adaptive thresholding to produce a black-and-white image.
    ///
    /// Uses a local mean approach: for each pixel, the threshold is the mean
    /// intensity within a `block_radius` neighbourhood, minus a constant `c`.
    /// Pixels darker than the local threshold become black; others become white.
    #[instrument(skip(self))]
    pub fn binarize(self, block_radius: u32, c: i32) -> Self {
        info!(block_radius, c, "Applying adaptive binarization");

        let gray = self.image.to_luma8();
        let (width, height) = gray.dimensions();
        let integral = compute_integral_image(&gray);

        let output = GrayImage::from_fn(width, height, |x, y| {
            let local_mean = region_mean(&integral, width, height, x, y, block_radius);
            let threshold = (local_mean as i32 - c).clamp(0, 255) as u8;
            let value = gray.get_pixel(x, y).0[0];
            Luma([if value < threshold { 0u8 } else { 255u8 }])
        });

        debug!("Binarization complete");
        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    /// Global binarization at the Otsu threshold of the image histogram.
    #[instrument(skip(self))]
    pub fn binarize_otsu(self) -> Self {
        let gray = self.image.to_luma8();
        let threshold = otsu_level(&gray);
        info!(threshold, "Applying Otsu binarization");

        // The Otsu level is the top of the dark class.
        let output = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let value = gray.get_pixel(x, y).0[0];
            Luma([if value <= threshold { 0u8 } else { 255u8 }])
        });

        Self {
            image: DynamicImage::ImageLuma8(output),
        }
    }

    /// Binarization tuned for unevenly lit captures:
    ///
    /// 1. Convert to grayscale
    /// 2. Stretch contrast (factor 1.4)
    /// 3. Adaptive binarization (block_radius=15, c=10)
    #[instrument(skip(self))]
    pub fn binarize_for_ocr(self) -> Self {
        info!("Running OCR binarization pipeline");

        let gray = ImageProcessor::from_dynamic(self.image).grayscale().into_dynamic();
        let mut rgba = gray.to_rgba8();
        apply_contrast_pass(&mut rgba, OCR_CONTRAST);

        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
        .binarize(OCR_BLOCK_RADIUS, OCR_THRESHOLD_OFFSET)
    }
}

/// Multiply distance from mid-gray by `factor` on R, G and B.
fn apply_contrast_pass(rgba: &mut RgbaImage, factor: f32) {
    for pixel in rgba.pixels_mut() {
        let [r, g, b, _] = &mut pixel.0;
        for channel in [r, g, b] {
            *channel = clamp_channel(apply_contrast(*channel as f32, factor));
        }
    }
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` contains the sum of all pixel values in the
/// rectangle [0, 0) to (x, y) (exclusive on both axes). The table has
/// dimensions `(width+1) x (height+1)` with a zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within a square region centred on (cx, cy), clamped to
/// the image, looked up from the integral image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

// -- Tests --------------------------------------------------------------------
