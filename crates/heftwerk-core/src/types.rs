// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Heftwerk capture-to-PDF pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A4 portrait width in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 portrait height in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;
/// Margin kept clear on every edge of a page, in millimetres.
pub const PAGE_MARGIN_MM: f64 = 10.0;

/// Supported input media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
    Gif,
    Pdf,
    /// Anything we could not identify.
    Unknown,
}

impl MediaType {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Pdf => "application/pdf",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Parse a MIME type string (parameters such as `; charset=` are ignored).
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            "image/webp" => Self::Webp,
            "image/gif" => Self::Gif,
            "application/pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    /// Infer media type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Identify content by its leading magic bytes.
    pub fn sniff(data: &[u8]) -> Self {
        match data {
            [0xFF, 0xD8, 0xFF, ..] => Self::Jpeg,
            [0x89, b'P', b'N', b'G', ..] => Self::Png,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Self::Webp,
            [b'G', b'I', b'F', b'8', ..] => Self::Gif,
            [b'%', b'P', b'D', b'F', ..] => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    /// Conventional file extension, used when a compressed upload is renamed.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Pdf => "pdf",
            Self::Unknown => "bin",
        }
    }

    /// Raster image types (anything the normalizer may be able to decode).
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Webp | Self::Gif)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Undecoded image bytes as handed over by the capture or upload side.
///
/// Immutable once constructed. The pipeline owns each source for the duration
/// of one run and drops it as soon as its batch has been normalized.
#[derive(Clone)]
pub struct RawImageSource {
    data: Vec<u8>,
    media_type: MediaType,
}

impl RawImageSource {
    /// Wrap raw bytes, sniffing the media type from their content.
    pub fn new(data: Vec<u8>) -> Self {
        let media_type = MediaType::sniff(&data);
        Self { data, media_type }
    }

    /// Wrap raw bytes with a media type declared by the caller.
    pub fn with_media_type(data: Vec<u8>, media_type: MediaType) -> Self {
        Self { data, media_type }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }
}

impl fmt::Debug for RawImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawImageSource")
            .field("len", &self.data.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// Encode quality and canvas size applied to every image of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingPolicy {
    /// Encoder quality in (0, 1].
    pub quality: f32,
    pub target_width: u32,
    /// Always `round(target_width * 297 / 210)`.
    pub target_height: u32,
}

impl ProcessingPolicy {
    /// Build a policy, deriving the height from the A4 aspect ratio.
    pub fn new(quality: f32, target_width: u32) -> Self {
        let target_height = (target_width as f64 * A4_HEIGHT_MM / A4_WIDTH_MM).round() as u32;
        Self {
            quality,
            target_width,
            target_height,
        }
    }

    /// Quality on the 1-100 scale JPEG encoders expect.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Channel layout of an encoded raster, needed to describe it inside a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorModel {
    Rgb,
    Gray,
}

/// Why a normalized image is not the full-fidelity result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degradation {
    /// The source could not be decoded; the bytes are the original input.
    DecodeFailed { reason: String },
    /// Colour encoding failed; the bytes are a grayscale encode at the same quality.
    EncodeFallback { reason: String },
    /// Every encode attempt failed; the bytes are the original input.
    EncodeFailed { reason: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecodeFailed { reason } => write!(f, "decode failed: {reason}"),
            Self::EncodeFallback { reason } => write!(f, "grayscale fallback: {reason}"),
            Self::EncodeFailed { reason } => write!(f, "encode failed: {reason}"),
        }
    }
}

/// Output of the normalizer for one input image.
#[derive(Clone)]
pub struct NormalizedImage {
    /// 0-based position of the source in the input sequence.
    pub index: usize,
    pub bytes: Vec<u8>,
    /// Pixel width, or 0 when unknown (degraded originals that cannot be probed).
    pub width: u32,
    /// Pixel height, or 0 when unknown.
    pub height: u32,
    pub byte_size: usize,
    pub media_type: MediaType,
    pub color_model: ColorModel,
    pub degradation: Option<Degradation>,
}

impl NormalizedImage {
    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }

    /// Width / height, or `None` when either dimension is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}

impl fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("byte_size", &self.byte_size)
            .field("media_type", &self.media_type)
            .field("color_model", &self.color_model)
            .field("degradation", &self.degradation)
            .finish()
    }
}

/// One observation of pipeline progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// 0-100, non-decreasing within a run.
    pub percent: f64,
    pub step: String,
}

impl ProgressState {
    pub fn new(percent: f64, step: impl Into<String>) -> Self {
        Self {
            percent,
            step: step.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_recognises_magic_bytes() {
        assert_eq!(MediaType::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), MediaType::Jpeg);
        assert_eq!(MediaType::sniff(b"\x89PNG\r\n\x1a\n"), MediaType::Png);
        assert_eq!(MediaType::sniff(b"RIFF\0\0\0\0WEBPVP8 "), MediaType::Webp);
        assert_eq!(MediaType::sniff(b"GIF89a"), MediaType::Gif);
        assert_eq!(MediaType::sniff(b"%PDF-1.7"), MediaType::Pdf);
        assert_eq!(MediaType::sniff(b"hello"), MediaType::Unknown);
        assert_eq!(MediaType::sniff(&[]), MediaType::Unknown);
    }

    #[test]
    fn mime_parsing_ignores_parameters() {
        assert_eq!(MediaType::from_mime("image/JPEG; q=1"), MediaType::Jpeg);
        assert_eq!(MediaType::from_mime("text/plain"), MediaType::Unknown);
        assert_eq!(MediaType::from_mime(MediaType::Pdf.mime_type()), MediaType::Pdf);
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(MediaType::from_extension("JPG"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_extension("heic"), None);
        assert!(MediaType::Webp.is_image());
        assert!(!MediaType::Pdf.is_image());
    }

    #[test]
    fn policy_derives_a4_height() {
        let policy = ProcessingPolicy::new(0.7, 1100);
        assert_eq!(policy.target_height, 1556);
        assert_eq!(ProcessingPolicy::new(0.88, 1700).target_height, 2404);
        assert_eq!(ProcessingPolicy::new(0.6, 900).target_height, 1273);
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        assert_eq!(ProcessingPolicy::new(0.82, 10).jpeg_quality(), 82);
        assert_eq!(ProcessingPolicy::new(0.0, 10).jpeg_quality(), 1);
        assert_eq!(ProcessingPolicy::new(1.5, 10).jpeg_quality(), 100);
    }

    #[test]
    fn raw_source_sniffs_on_construction() {
        let source = RawImageSource::new(b"%PDF-1.4".to_vec());
        assert_eq!(source.media_type(), MediaType::Pdf);
        assert_eq!(source.len(), 8);
        let declared = RawImageSource::with_media_type(vec![1, 2, 3], MediaType::Png);
        assert_eq!(declared.media_type(), MediaType::Png);
    }

    #[test]
    fn degenerate_dimensions_have_no_aspect_ratio() {
        let image = NormalizedImage {
            index: 0,
            bytes: Vec::new(),
            width: 0,
            height: 40,
            byte_size: 0,
            media_type: MediaType::Unknown,
            color_model: ColorModel::Rgb,
            degradation: Some(Degradation::DecodeFailed {
                reason: "bad".into(),
            }),
        };
        assert!(image.is_degraded());
        assert_eq!(image.aspect_ratio(), None);
    }
}
