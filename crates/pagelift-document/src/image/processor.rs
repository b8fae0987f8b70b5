// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, proportional downscale, grayscale, and encoding.
// Operates on in-memory images using the `image` crate.

use image::{DynamicImage, ImageFormat as CodecFormat};
use pagelift_core::ImageFormat;
use pagelift_core::error::{PageliftError, Result};
use tracing::{debug, info, instrument};

use super::encoded::EncodedImage;

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let thumb = ImageProcessor::from_bytes(&photo)?
///     .downscale_to_width(150)
///     .to_jpeg_bytes(60)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = decode(data)?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image })
    }

    /// Decode an [`EncodedImage`].
    pub fn from_encoded(encoded: &EncodedImage) -> Result<Self> {
        Self::from_bytes(encoded.bytes())
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Shrink the image so its width does not exceed `max_width`, preserving
    /// aspect ratio. Images already narrow enough are returned untouched.
    /// Uses Lanczos3 filtering for high-quality downscaling.
    #[instrument(skip(self))]
    pub fn downscale_to_width(self, max_width: u32) -> Self {
        let (from_w, from_h) = (self.image.width(), self.image.height());
        let (new_w, new_h) = scaled_dimensions(from_w, from_h, max_width);
        if (new_w, new_h) == (from_w, from_h) {
            debug!(from_w, from_h, "No downscale needed");
            return self;
        }

        info!(from_w, from_h, new_w, new_h, "Downscaling image");
        let resized =
            self.image
                .resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    /// Convert the image to grayscale (luma).
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        Self {
            image: self.image.grayscale(),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, CodecFormat::Png)
            .map_err(|err| PageliftError::Encode(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    ///
    /// JPEG has no alpha channel; alpha is discarded.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| PageliftError::Encode(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode into the requested format. `quality` only applies to JPEG.
    pub fn encode(&self, format: ImageFormat, quality: u8) -> Result<EncodedImage> {
        let bytes = match format {
            ImageFormat::Jpeg => self.to_jpeg_bytes(quality)?,
            ImageFormat::Png => self.to_png_bytes()?,
        };
        debug!(
            format = format.mime_type(),
            bytes = bytes.len(),
            "Image encoded"
        );
        Ok(EncodedImage::new(bytes, format))
    }
}

/// Decode encoded bytes into a raster, rejecting empty rasters.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(data)
        .map_err(|err| PageliftError::Decode(format!("failed to decode image: {}", err)))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PageliftError::DegenerateGeometry {
            width: image.width() as i64,
            height: image.height() as i64,
        });
    }
    Ok(image)
}

/// Dimensions after shrinking `width` x `height` to at most `max_width` wide.
///
/// The scale factor is `min(1, max_width / width)` and both sides are floored,
/// never dropping below one pixel. Integer arithmetic keeps the floor exact.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width == 0 || max_width >= width {
        return (width, height);
    }
    let max_width = max_width.max(1);
    let new_h = (height as u64 * max_width as u64 / width as u64).max(1) as u32;
    (max_width, new_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gray_image(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
    }

    #[test]
    fn scaled_dimensions_follow_floor_rule() {
        assert_eq!(scaled_dimensions(400, 300, 150), (150, 112));
        assert_eq!(scaled_dimensions(3000, 4000, 1200), (1200, 1600));
        assert_eq!(scaled_dimensions(1000, 333, 300), (300, 99));
    }

    #[test]
    fn scaled_dimensions_never_upscale() {
        assert_eq!(scaled_dimensions(100, 80, 150), (100, 80));
        assert_eq!(scaled_dimensions(150, 80, 150), (150, 80));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(scaled_dimensions(5000, 2, 100), (100, 1));
    }

    #[test]
    fn downscale_preserves_aspect_ratio() {
        let processor = ImageProcessor::from_dynamic(gray_image(640, 480, 90)).downscale_to_width(200);
        assert_eq!(processor.width(), 200);
        assert_eq!(processor.height(), 150);
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let processor = ImageProcessor::from_dynamic(gray_image(64, 48, 128));
        let bytes = processor.to_jpeg_bytes(92).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn png_preserves_alpha_exactly() {
        let rgba = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 40]));
        let processor = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(rgba.clone()));
        let encoded = processor.encode(ImageFormat::Png, 0).unwrap();
        assert_eq!(encoded.format(), ImageFormat::Png);

        let decoded = decode(encoded.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded, rgba);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = ImageProcessor::from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(PageliftError::Decode(_))));
    }
}
