// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-channel arithmetic shared by the enhancement and filter passes.

/// Mean channel brightness above which a pixel is pushed towards white.
pub const WHITE_PUSH_THRESHOLD: f32 = 180.0;
/// Gain applied to each channel of a bright pixel.
pub const WHITE_PUSH_GAIN: f32 = 1.3;
/// Flat offset added to every channel by shadow removal.
pub const SHADOW_LIFT: f32 = 15.0;
/// Contrast level of the clarity boost.
pub const CLARITY_CONTRAST: f32 = 1.2;
/// Manual brightness units to channel units (-100..100 onto roughly -255..255).
pub const BRIGHTNESS_SCALE: f32 = 2.55;

/// Multiplier for the standard contrast curve at level `contrast`.
///
/// `259 * (c + 255) / (255 * (259 - c))`; a level of 0 gives exactly 1.
pub fn contrast_factor(contrast: f32) -> f32 {
    259.0 * (contrast + 255.0) / (255.0 * (259.0 - contrast))
}

/// Apply the contrast curve around mid-gray.
#[inline]
pub fn apply_contrast(value: f32, factor: f32) -> f32 {
    factor * (value - 128.0) + 128.0
}

/// ITU-R BT.601 luma.
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Round to the nearest integer (ties to even) and clamp into a channel byte.
#[inline]
pub fn clamp_channel(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Mean of the three colour channels.
#[inline]
pub fn mean_brightness(r: u8, g: u8, b: u8) -> f32 {
    (r as f32 + g as f32 + b as f32) / 3.0
}
