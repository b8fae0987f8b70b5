// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — enhancement, manual filters, border detection, cropping,
// and binarization for OCR preprocessing.

pub mod adjust;
pub mod borders;
pub mod enhance;

pub use borders::{BorderDetection, crop, detect_borders};
pub use enhance::ScanEnhancer;
