// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagelift-document — Document image engine for Pagelift.
//
// Provides image processing (decode, downscale, encode, data URLs), a scan
// pipeline (enhancement, manual filters, border detection, cropping,
// binarization for OCR), PDF page assembly, and an engine facade with
// blocking and async entry points.

pub mod engine;
pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `pagelift_document::ImageEngine` etc.
pub use crate::engine::ImageEngine;
pub use crate::image::encoded::{EncodedImage, PreparedPage};
pub use crate::image::processor::ImageProcessor;
pub use crate::pdf::writer::PdfWriter;
pub use crate::scan::borders::{BorderDetection, crop, detect_borders};
pub use crate::scan::enhance::ScanEnhancer;
