// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decode, downscale, encode, and data URL interchange.

pub mod encoded;
pub mod processor;

pub use encoded::{EncodedImage, PreparedPage};
pub use processor::ImageProcessor;
