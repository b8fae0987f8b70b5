// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — assemble prepared page images into a PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use pagelift_core::{PAGE_MARGIN_MM, PaperSize};
use pagelift_core::error::{PageliftError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::image::encoded::PreparedPage;
use crate::image::processor::ImageProcessor;

/// Page margin on every side.
const MARGIN_MM: f32 = PAGE_MARGIN_MM as f32;
/// Native resolution images are placed at before fitting.
const IMAGE_DPI: f32 = 150.0;

/// Where and how large a page image is drawn, in PDF points from the
/// bottom-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub x_pt: f32,
    pub y_pt: f32,
    pub width_pt: f32,
    pub height_pt: f32,
    /// Factor applied to the image's native size at [`IMAGE_DPI`].
    pub scale: f32,
}

/// Creates PDF documents from prepared page images.
pub struct PdfWriter {
    /// Paper size for page creation.
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Create a new writer defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Fit a `width_px` x `height_px` image inside the page margins.
    ///
    /// The image's native size is taken at 150 DPI; it is shrunk to fit the
    /// usable area if needed (never enlarged) and centred.
    pub fn layout_image(&self, width_px: u32, height_px: u32) -> PageLayout {
        let (page_w, page_h) = self.page_dimensions();
        let usable_w_pt = Mm(page_w.0 - 2.0 * MARGIN_MM).into_pt().0;
        let usable_h_pt = Mm(page_h.0 - 2.0 * MARGIN_MM).into_pt().0;

        let img_w_pt = width_px.max(1) as f32 / IMAGE_DPI * 72.0;
        let img_h_pt = height_px.max(1) as f32 / IMAGE_DPI * 72.0;

        let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);
        let width_pt = img_w_pt * scale;
        let height_pt = img_h_pt * scale;

        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        PageLayout {
            x_pt: margin_pt + (usable_w_pt - width_pt) / 2.0,
            y_pt: margin_pt + (usable_h_pt - height_pt) / 2.0,
            width_pt,
            height_pt,
            scale,
        }
    }

    /// Create a PDF with one page per prepared image, in order.
    #[instrument(skip(self, pages), fields(page_count = pages.len()))]
    pub fn create_from_pages(&self, pages: &[PreparedPage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(PageliftError::PdfError("no pages to write".into()));
        }

        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Pagelift Document");
        info!(paper = ?self.paper_size, title, "Assembling PDF");

        let mut doc = PdfDocument::new(title);
        let mut pdf_pages = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            let raster = ImageProcessor::from_encoded(&page.image)?.into_dynamic();
            let (width, height) = (raster.width(), raster.height());
            let rgb = raster.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let layout = self.layout_image(width, height);
            if layout.scale.is_nan() || layout.scale <= 0.0 {
                return Err(PageliftError::PdfError(format!(
                    "{:?} paper leaves no room inside the {MARGIN_MM} mm margins",
                    self.paper_size
                )));
            }
            debug!(
                index,
                width,
                height,
                x_pt = layout.x_pt,
                y_pt = layout.y_pt,
                scale = layout.scale,
                "Page image placed"
            );

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(layout.x_pt)),
                    translate_y: Some(Pt(layout.y_pt)),
                    scale_x: Some(layout.scale),
                    scale_y: Some(layout.scale),
                    dpi: Some(IMAGE_DPI),
                    rotate: None,
                },
            }];
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            pdf_bytes = output.len(),
            warnings = warnings.len(),
            "PDF serialised"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::encoded::EncodedImage;
    use image::{DynamicImage, Rgb, RgbImage};
    use pagelift_core::ImageFormat;

    fn prepared(width: u32, height: u32) -> PreparedPage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 190, 180])));
        let bytes = ImageProcessor::from_dynamic(img).to_jpeg_bytes(85).unwrap();
        PreparedPage {
            image: EncodedImage::new(bytes, ImageFormat::Jpeg),
            width,
            height,
        }
    }

    #[test]
    fn small_image_is_centred_at_native_size() {
        let writer = PdfWriter::a4();
        let layout = writer.layout_image(300, 150);
        assert_eq!(layout.scale, 1.0);
        assert!((layout.width_pt - 144.0).abs() < 1e-3);
        assert!((layout.height_pt - 72.0).abs() < 1e-3);

        let page_w_pt = Mm(210.0).into_pt().0;
        let centre = layout.x_pt + layout.width_pt / 2.0;
        assert!((centre - page_w_pt / 2.0).abs() < 0.5);
    }

    #[test]
    fn large_image_fits_inside_margins() {
        let writer = PdfWriter::new(PaperSize::Letter);
        let layout = writer.layout_image(4000, 3000);
        assert!(layout.scale < 1.0);

        let margin = Mm(MARGIN_MM).into_pt().0;
        let page_w_pt = Mm(216.0).into_pt().0;
        assert!(layout.x_pt >= margin - 1e-3);
        assert!(layout.x_pt + layout.width_pt <= page_w_pt - margin + 1e-3);
        assert!((layout.width_pt / layout.height_pt - 4.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn one_pdf_page_per_prepared_image() {
        let mut writer = PdfWriter::a4();
        writer.set_title("Receipts");
        let pdf = writer
            .create_from_pages(&[prepared(120, 160), prepared(160, 120), prepared(50, 50)])
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let doc = lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn empty_page_list_is_an_error() {
        let result = PdfWriter::a4().create_from_pages(&[]);
        assert!(matches!(result, Err(PageliftError::PdfError(_))));
    }

    #[test]
    fn paper_smaller_than_margins_is_an_error() {
        let writer = PdfWriter::new(PaperSize::Custom {
            width_mm: 20,
            height_mm: 20,
        });
        assert!(writer.layout_image(300, 150).scale < 0.0);
        assert!(matches!(
            writer.create_from_pages(&[prepared(300, 150)]),
            Err(PageliftError::PdfError(_))
        ));
    }

    #[test]
    fn undecodable_page_is_rejected() {
        let page = PreparedPage {
            image: EncodedImage::new(b"nope".to_vec(), ImageFormat::Jpeg),
            width: 10,
            height: 10,
        };
        assert!(matches!(
            PdfWriter::a4().create_from_pages(&[page]),
            Err(PageliftError::Decode(_))
        ));
    }
}
