// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — assembling prepared page images into a PDF.

pub mod writer;

pub use writer::{PageLayout, PdfWriter};
