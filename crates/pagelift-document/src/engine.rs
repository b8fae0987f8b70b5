// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine facade — the caller-facing operations over encoded images.
//
// Each operation decodes its input, runs one transform, and re-encodes. The
// `*_raster` variants skip the codec so multi-step pipelines encode once. The
// `*_async` variants run the same work on tokio's blocking pool so a caller's
// only suspension point is "transform finished".

use image::DynamicImage;
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::{Corner, EngineConfig, EnhancementOptions, FilterOptions, ImageFormat};
use tracing::{debug, instrument};

use crate::image::encoded::{EncodedImage, PreparedPage};
use crate::image::processor::{ImageProcessor, decode};
use crate::pdf::writer::PdfWriter;
use crate::scan::borders::{self, BorderDetection};
use crate::scan::enhance::ScanEnhancer;

/// Stateless image engine parameterised by an [`EngineConfig`].
///
/// Cloning is cheap; calls never share mutable state, so any number may run
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct ImageEngine {
    config: EngineConfig,
}

impl ImageEngine {
    /// Build an engine from a validated config.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Background/shadow/clarity correction, re-encoded as JPEG.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn enhance(&self, image: &[u8], options: EnhancementOptions) -> Result<EncodedImage> {
        let enhanced = self.enhance_raster(decode(image)?, options);
        self.encode_full(enhanced)
    }

    /// Enhance an already-decoded raster without re-encoding it.
    pub fn enhance_raster(&self, image: DynamicImage, options: EnhancementOptions) -> DynamicImage {
        ScanEnhancer::from_dynamic(image).enhance(options).into_dynamic()
    }

    /// Estimate the document rectangle and hand back the decoded raster.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn detect_borders(&self, image: &[u8]) -> Result<BorderDetection> {
        borders::detect_borders(decode(image)?)
    }

    /// Crop a decoded raster to the bounding box of `corners`.
    ///
    /// Encoded as PNG when the result holds transparent pixels (a box reaching
    /// past the source edge), so the fill survives; JPEG otherwise.
    #[instrument(skip(self, image, corners))]
    pub fn crop(&self, image: &DynamicImage, corners: &[Corner]) -> Result<EncodedImage> {
        let cropped = borders::crop(image, corners)?;
        let has_transparency = cropped
            .as_rgba8()
            .is_some_and(|rgba| rgba.pixels().any(|p| p.0[3] < 255));
        let format = if has_transparency {
            ImageFormat::Png
        } else {
            ImageFormat::Jpeg
        };
        ImageProcessor::from_dynamic(cropped).encode(format, self.config.jpeg_quality)
    }

    /// Detect borders and crop in one call.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn auto_crop(&self, image: &[u8]) -> Result<EncodedImage> {
        let cropped = borders::auto_crop(decode(image)?)?;
        self.encode_full(cropped)
    }

    /// Manual brightness/contrast/black-and-white adjustment.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn apply_filters(&self, image: &[u8], options: FilterOptions) -> Result<EncodedImage> {
        let filtered = ScanEnhancer::from_bytes(image)?
            .apply_filters(options)
            .into_dynamic();
        self.encode_full(filtered)
    }

    /// Downscaled low-quality preview. `max_width` defaults to the configured
    /// thumbnail width.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn thumbnail(&self, image: &[u8], max_width: Option<u32>) -> Result<EncodedImage> {
        let max_width = max_width.unwrap_or(self.config.thumbnail_max_width);
        ImageProcessor::from_bytes(image)?
            .downscale_to_width(max_width)
            .encode(ImageFormat::Jpeg, self.config.thumbnail_quality)
    }

    /// Downscale for embedding as a PDF page image.
    ///
    /// An undecodable source is reported as [`PageliftError::UnsupportedFormat`].
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn prepare_for_pdf(&self, image: &[u8], max_width: Option<u32>) -> Result<PreparedPage> {
        let raster = decode(image).map_err(|err| match err {
            PageliftError::Decode(detail) => PageliftError::UnsupportedFormat(detail),
            other => other,
        })?;
        self.prepare_raster_for_pdf(raster, max_width)
    }

    /// Downscale and encode a decoded raster as a PDF page image.
    ///
    /// This is the only lossy encode a page goes through on its way into a PDF.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn prepare_raster_for_pdf(
        &self,
        image: DynamicImage,
        max_width: Option<u32>,
    ) -> Result<PreparedPage> {
        let max_width = max_width.unwrap_or(self.config.pdf_max_width);
        let processor = ImageProcessor::from_dynamic(image).downscale_to_width(max_width);
        let (width, height) = (processor.width(), processor.height());
        let encoded = processor.encode(ImageFormat::Jpeg, self.config.pdf_quality)?;
        debug!(width, height, bytes = encoded.len(), "PDF page prepared");
        Ok(PreparedPage {
            image: encoded,
            width,
            height,
        })
    }

    /// Downscaled, Otsu-thresholded PNG for the OCR service.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub fn prepare_for_ocr(&self, image: &[u8]) -> Result<EncodedImage> {
        let gray = ImageProcessor::from_bytes(image)?
            .downscale_to_width(self.config.ocr_max_width)
            .grayscale()
            .into_dynamic();
        let binary = ScanEnhancer::from_dynamic(gray).binarize_otsu().into_dynamic();
        ImageProcessor::from_dynamic(binary).encode(ImageFormat::Png, self.config.jpeg_quality)
    }

    /// Assemble prepared pages into a PDF on the configured paper size.
    pub fn assemble_pdf(&self, pages: &[PreparedPage], title: Option<&str>) -> Result<Vec<u8>> {
        let mut writer = PdfWriter::new(self.config.paper_size);
        if let Some(title) = title {
            writer.set_title(title);
        }
        writer.create_from_pages(pages)
    }

    fn encode_full(&self, image: DynamicImage) -> Result<EncodedImage> {
        ImageProcessor::from_dynamic(image).encode(ImageFormat::Jpeg, self.config.jpeg_quality)
    }

    // -- Async variants -------------------------------------------------------

    pub async fn decode_async(&self, image: Vec<u8>) -> Result<DynamicImage> {
        run_blocking(move || decode(&image)).await
    }

    pub async fn enhance_async(
        &self,
        image: Vec<u8>,
        options: EnhancementOptions,
    ) -> Result<EncodedImage> {
        let engine = self.clone();
        run_blocking(move || engine.enhance(&image, options)).await
    }

    pub async fn detect_borders_async(&self, image: Vec<u8>) -> Result<BorderDetection> {
        let engine = self.clone();
        run_blocking(move || engine.detect_borders(&image)).await
    }

    pub async fn detect_borders_raster_async(&self, image: DynamicImage) -> Result<BorderDetection> {
        run_blocking(move || borders::detect_borders(image)).await
    }

    /// Crop without encoding; the result stays a raster for further passes.
    pub async fn crop_raster_async(
        &self,
        image: DynamicImage,
        corners: Vec<Corner>,
    ) -> Result<DynamicImage> {
        run_blocking(move || borders::crop(&image, &corners)).await
    }

    pub async fn enhance_raster_async(
        &self,
        image: DynamicImage,
        options: EnhancementOptions,
    ) -> Result<DynamicImage> {
        let engine = self.clone();
        run_blocking(move || Ok(engine.enhance_raster(image, options))).await
    }

    pub async fn prepare_raster_for_pdf_async(
        &self,
        image: DynamicImage,
        max_width: Option<u32>,
    ) -> Result<PreparedPage> {
        let engine = self.clone();
        run_blocking(move || engine.prepare_raster_for_pdf(image, max_width)).await
    }

    pub async fn crop_async(
        &self,
        image: DynamicImage,
        corners: Vec<Corner>,
    ) -> Result<EncodedImage> {
        let engine = self.clone();
        run_blocking(move || engine.crop(&image, &corners)).await
    }

    pub async fn auto_crop_async(&self, image: Vec<u8>) -> Result<EncodedImage> {
        let engine = self.clone();
        run_blocking(move || engine.auto_crop(&image)).await
    }

    pub async fn apply_filters_async(
        &self,
        image: Vec<u8>,
        options: FilterOptions,
    ) -> Result<EncodedImage> {
        let engine = self.clone();
        run_blocking(move || engine.apply_filters(&image, options)).await
    }

    pub async fn thumbnail_async(
        &self,
        image: Vec<u8>,
        max_width: Option<u32>,
    ) -> Result<EncodedImage> {
        let engine = self.clone();
        run_blocking(move || engine.thumbnail(&image, max_width)).await
    }

    pub async fn prepare_for_pdf_async(
        &self,
        image: Vec<u8>,
        max_width: Option<u32>,
    ) -> Result<PreparedPage> {
        let engine = self.clone();
        run_blocking(move || engine.prepare_for_pdf(&image, max_width)).await
    }

    pub async fn prepare_for_ocr_async(&self, image: Vec<u8>) -> Result<EncodedImage> {
        let engine = self.clone();
        run_blocking(move || engine.prepare_for_ocr(&image)).await
    }
}

/// Run a transform on the blocking pool, surfacing a panic or cancellation as
/// [`PageliftError::Task`].
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PageliftError::Task(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        ImageProcessor::from_dynamic(image).to_png_bytes().unwrap()
    }

    fn mid_gray(width: u32, height: u32) -> Vec<u8> {
        png_bytes(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([128, 128, 128]),
        )))
    }

    fn assert_near(actual: [u8; 3], expected: u8, tolerance: u8) {
        for channel in actual {
            assert!(
                channel.abs_diff(expected) <= tolerance,
                "{actual:?} not within {tolerance} of {expected}"
            );
        }
    }

    #[test]
    fn shadow_removal_end_to_end() {
        let engine = ImageEngine::default();
        let out = engine
            .enhance(
                &mid_gray(400, 300),
                EnhancementOptions {
                    remove_shadows: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(out.format(), ImageFormat::Jpeg);

        let decoded = decode(out.bytes()).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (400, 300));
        // Lossy re-encode of a flat field may drift by a level or two.
        assert_near(decoded.get_pixel(200, 150).0, 143, 2);
    }

    #[test]
    fn noop_enhance_only_recompresses() {
        let engine = ImageEngine::default();
        let out = engine
            .enhance(&mid_gray(64, 64), EnhancementOptions::default())
            .unwrap();
        let decoded = decode(out.bytes()).unwrap().to_rgb8();
        assert_near(decoded.get_pixel(10, 10).0, 128, 2);
    }

    #[test]
    fn thumbnail_end_to_end() {
        let engine = ImageEngine::default();
        let thumb = engine.thumbnail(&mid_gray(400, 300), None).unwrap();
        let decoded = decode(thumb.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 112));
    }

    #[test]
    fn thumbnail_never_upscales() {
        let engine = ImageEngine::default();
        let thumb = engine.thumbnail(&mid_gray(90, 40), Some(150)).unwrap();
        let decoded = decode(thumb.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (90, 40));
    }

    #[test]
    fn pdf_preparation_reports_dimensions() {
        let engine = ImageEngine::default();
        let page = engine.prepare_for_pdf(&mid_gray(2400, 1800), None).unwrap();
        assert_eq!((page.width, page.height), (1200, 900));

        let decoded = decode(page.image.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 900));
    }

    #[test]
    fn pdf_preparation_rejects_non_images() {
        let engine = ImageEngine::default();
        let result = engine.prepare_for_pdf(b"%PDF-1.7 not an image", None);
        assert!(matches!(result, Err(PageliftError::UnsupportedFormat(_))));
    }

    #[test]
    fn enhance_rejects_non_images() {
        let engine = ImageEngine::default();
        let result = engine.enhance(b"garbage", EnhancementOptions::default());
        assert!(matches!(result, Err(PageliftError::Decode(_))));
    }

    #[test]
    fn detect_then_crop_reuses_decoded_raster() {
        let mut page = RgbaImage::from_pixel(200, 160, Rgba([255, 255, 255, 255]));
        for y in 40..101 {
            for x in 60..141 {
                page.put_pixel(x, y, Rgba([10, 10, 10, 255]));
            }
        }
        let engine = ImageEngine::default();
        let detection = engine
            .detect_borders(&png_bytes(DynamicImage::ImageRgba8(page)))
            .unwrap();
        let cropped = engine.crop(&detection.image, &detection.corners).unwrap();
        assert_eq!(cropped.format(), ImageFormat::Jpeg);

        // Samples 60..140 x 40..100, padded by 10.
        let decoded = decode(cropped.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 80));
    }

    #[test]
    fn crop_past_the_edge_keeps_transparency() {
        let engine = ImageEngine::default();
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([9, 9, 9])));
        let out = engine
            .crop(&source, &[Corner::new(10, 10), Corner::new(30, 30)])
            .unwrap();
        assert_eq!(out.format(), ImageFormat::Png);
        let decoded = decode(out.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(15, 15).0[3], 0);
        assert_eq!(decoded.get_pixel(2, 2).0, [9, 9, 9, 255]);
    }

    #[test]
    fn ocr_preparation_is_binary_png() {
        let mut page = RgbImage::from_pixel(120, 80, Rgb([235, 230, 220]));
        for y in 30..50 {
            for x in 20..100 {
                page.put_pixel(x, y, Rgb([30, 30, 30]));
            }
        }
        let engine = ImageEngine::default();
        let out = engine
            .prepare_for_ocr(&png_bytes(DynamicImage::ImageRgb8(page)))
            .unwrap();
        assert_eq!(out.format(), ImageFormat::Png);
        let decoded = decode(out.bytes()).unwrap().to_luma8();
        assert!(decoded.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(decoded.get_pixel(50, 40).0[0], 0);
        assert_eq!(decoded.get_pixel(5, 5).0[0], 255);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            pdf_quality: 101,
            ..Default::default()
        };
        assert!(matches!(
            ImageEngine::new(config),
            Err(PageliftError::Config(_))
        ));
    }

    #[test]
    fn prepared_pages_assemble_into_pdf() {
        let engine = ImageEngine::default();
        let pages = vec![
            engine.prepare_for_pdf(&mid_gray(300, 400), None).unwrap(),
            engine.prepare_for_pdf(&mid_gray(400, 300), None).unwrap(),
        ];
        let pdf = engine.assemble_pdf(&pages, Some("Scan")).unwrap();
        let doc = lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[tokio::test]
    async fn async_variants_match_blocking_results() {
        let engine = ImageEngine::default();
        let source = mid_gray(400, 300);

        let thumb = engine.thumbnail_async(source.clone(), None).await.unwrap();
        assert_eq!(thumb, engine.thumbnail(&source, None).unwrap());

        let raster = engine.decode_async(source.clone()).await.unwrap();
        assert_eq!((raster.width(), raster.height()), (400, 300));

        let page = engine.prepare_for_pdf_async(source, Some(200)).await.unwrap();
        assert_eq!((page.width, page.height), (200, 150));
    }

    #[test]
    fn raster_pdf_preparation_encodes_once() {
        let engine = ImageEngine::default();
        let raster = DynamicImage::ImageRgb8(RgbImage::from_pixel(2400, 1800, Rgb([128, 128, 128])));
        let page = engine.prepare_raster_for_pdf(raster, None).unwrap();
        assert_eq!((page.width, page.height), (1200, 900));
        assert_eq!(page.image.format(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn raster_pipeline_keeps_exact_pixels_until_pdf_encode() {
        let mut page = RgbImage::from_pixel(240, 200, Rgb([252, 252, 252]));
        for y in 60..121 {
            for x in 40..181 {
                page.put_pixel(x, y, Rgb([30, 30, 30]));
            }
        }
        let engine = ImageEngine::default();
        let detection = engine
            .detect_borders_raster_async(DynamicImage::ImageRgb8(page))
            .await
            .unwrap();
        let cropped = engine
            .crop_raster_async(detection.image, detection.corners.to_vec())
            .await
            .unwrap();
        let enhanced = engine
            .enhance_raster_async(
                cropped,
                EnhancementOptions {
                    remove_shadows: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .to_rgba8();

        // Crop starts at (30, 50); no lossy encode has touched these values.
        assert_eq!((enhanced.width(), enhanced.height()), (160, 80));
        assert_eq!(enhanced.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(enhanced.get_pixel(20, 20).0, [45, 45, 45, 255]);
    }

    #[tokio::test]
    async fn auto_crop_async_trims_margins() {
        let mut page = RgbImage::from_pixel(240, 200, Rgb([252, 252, 252]));
        for y in 60..121 {
            for x in 40..181 {
                page.put_pixel(x, y, Rgb([30, 30, 30]));
            }
        }
        let engine = ImageEngine::default();
        let cropped = engine
            .auto_crop_async(png_bytes(DynamicImage::ImageRgb8(page)))
            .await
            .unwrap();
        // Samples 40..180 x 60..120, padded by 10.
        let decoded = decode(cropped.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (160, 80));
    }

    #[tokio::test]
    async fn async_decode_failure_surfaces_immediately() {
        let engine = ImageEngine::default();
        let result = engine
            .apply_filters_async(b"junk".to_vec(), FilterOptions::default())
            .await;
        assert!(matches!(result, Err(PageliftError::Decode(_))));
    }

    #[tokio::test]
    async fn concurrent_calls_are_independent() {
        let engine = ImageEngine::default();
        let jobs: Vec<_> = [100u32, 200, 300]
            .into_iter()
            .map(|w| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.thumbnail_async(mid_gray(w, w), Some(50)).await })
            })
            .collect();
        for job in jobs {
            let thumb = job.await.unwrap().unwrap();
            let decoded = decode(thumb.bytes()).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (50, 50));
        }
    }
}
