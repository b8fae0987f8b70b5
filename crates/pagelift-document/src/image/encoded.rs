// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encoded image interchange — raw encoded bytes tagged with their format, and
// conversion to and from base64 data URLs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pagelift_core::ImageFormat;
use pagelift_core::error::{PageliftError, Result};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// An encoded raster produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self { bytes, format }
    }

    /// Tag encoded bytes with their sniffed format.
    ///
    /// Bytes that are not a recognisable image are [`PageliftError::Decode`];
    /// images other than JPEG and PNG are [`PageliftError::UnsupportedFormat`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Ok(image::ImageFormat::Png) => ImageFormat::Png,
            Ok(other) => {
                return Err(PageliftError::UnsupportedFormat(format!("{other:?}")));
            }
            Err(err) => return Err(PageliftError::Decode(err.to_string())),
        };
        Ok(Self { bytes, format })
    }

    /// Parse a `data:image/jpeg;base64,...` or `data:image/png;base64,...` URL.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let (mime, bytes) = split_data_url(data_url)?;
        let format = ImageFormat::from_mime_type(mime).ok_or_else(|| {
            PageliftError::Decode(format!("data URL has unsupported MIME type {mime}"))
        })?;
        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render as a base64 data URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "{DATA_URL_PREFIX}{}{BASE64_MARKER}{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Decode the payload of any base64 image data URL, whatever its MIME type.
///
/// The bytes are returned as-is; the caller decodes them as a raster.
pub fn data_url_payload(data_url: &str) -> Result<Vec<u8>> {
    split_data_url(data_url).map(|(_, bytes)| bytes)
}

/// Accept either a data URL or raw encoded bytes read from elsewhere.
pub fn bytes_from_input(input: &[u8]) -> Result<Vec<u8>> {
    if input.starts_with(DATA_URL_PREFIX.as_bytes()) {
        let text = std::str::from_utf8(input)
            .map_err(|err| PageliftError::Decode(format!("data URL is not UTF-8: {err}")))?;
        data_url_payload(text.trim())
    } else {
        Ok(input.to_vec())
    }
}

fn split_data_url(data_url: &str) -> Result<(&str, Vec<u8>)> {
    let rest = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| PageliftError::Decode("not a data URL".into()))?;
    let marker = rest
        .find(BASE64_MARKER)
        .ok_or_else(|| PageliftError::Decode("data URL is not base64-encoded".into()))?;
    let mime = &rest[..marker];
    if !mime.starts_with("image/") {
        return Err(PageliftError::Decode(format!(
            "data URL does not hold an image: {mime}"
        )));
    }
    let payload = &rest[marker + BASE64_MARKER.len()..];
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|err| PageliftError::Decode(format!("invalid base64 payload: {err}")))?;
    Ok((mime, bytes))
}

/// A page image ready for PDF embedding, with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPage {
    pub image: EncodedImage,
    pub width: u32,
    pub height: u32,
}
