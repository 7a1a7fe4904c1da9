// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-image normalizer — decode one captured photo, stretch it onto the
// policy's fixed A4-proportioned canvas, and re-encode it as JPEG.
//
// The normalizer never fails. A photo that cannot be decoded comes back with
// its original bytes and a `Degradation` marker so the page is still placed.

use heftwerk_core::config::ResizeFilter;
use heftwerk_core::{
    ColorModel, Degradation, MediaType, NormalizedImage, ProcessingPolicy, RawImageSource,
};
use tracing::{debug, warn};

use super::processor::{ImageProcessor, probe_dimensions};

/// The normalize operation, shared by every executor.
///
/// Implementations must be callable from pool worker threads.
pub trait Normalize: Send + Sync {
    fn normalize(
        &self,
        source: &RawImageSource,
        policy: &ProcessingPolicy,
        index: usize,
    ) -> NormalizedImage;
}

/// Default normalizer: decode, stretch-fit, JPEG encode.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    filter: ResizeFilter,
}

impl Normalizer {
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ResizeFilter::Lanczos3)
    }
}

impl Normalize for Normalizer {
    fn normalize(
        &self,
        source: &RawImageSource,
        policy: &ProcessingPolicy,
        index: usize,
    ) -> NormalizedImage {
        let processor = match ImageProcessor::from_bytes(source.data()) {
            Ok(processor) => processor,
            Err(err) => {
                warn!(index, %err, "decode failed, keeping original bytes");
                return passthrough(
                    source,
                    index,
                    Degradation::DecodeFailed {
                        reason: err.to_string(),
                    },
                );
            }
        };

        // Stretch, not letterbox: every page image shares the policy canvas.
        let canvas = processor.resize_exact(policy.target_width, policy.target_height, self.filter);
        let quality = policy.jpeg_quality();

        match canvas.to_jpeg_bytes(quality, ColorModel::Rgb) {
            Ok(bytes) => {
                debug!(index, bytes = bytes.len(), quality, "image normalized");
                encoded(index, bytes, policy, ColorModel::Rgb, None)
            }
            Err(err) => {
                warn!(index, %err, "colour encode failed, retrying as grayscale");
                let reason = err.to_string();
                match canvas.grayscale().to_jpeg_bytes(quality, ColorModel::Gray) {
                    Ok(bytes) => encoded(
                        index,
                        bytes,
                        policy,
                        ColorModel::Gray,
                        Some(Degradation::EncodeFallback { reason }),
                    ),
                    Err(err) => {
                        warn!(index, %err, "grayscale encode failed, keeping original bytes");
                        passthrough(
                            source,
                            index,
                            Degradation::EncodeFailed {
                                reason: format!("{reason}; {err}"),
                            },
                        )
                    }
                }
            }
        }
    }
}

fn encoded(
    index: usize,
    bytes: Vec<u8>,
    policy: &ProcessingPolicy,
    color_model: ColorModel,
    degradation: Option<Degradation>,
) -> NormalizedImage {
    NormalizedImage {
        index,
        byte_size: bytes.len(),
        bytes,
        width: policy.target_width,
        height: policy.target_height,
        media_type: MediaType::Jpeg,
        color_model,
        degradation,
    }
}

/// Degraded result carrying the untouched source bytes.
pub fn passthrough(source: &RawImageSource, index: usize, degradation: Degradation) -> NormalizedImage {
    let (width, height) = probe_dimensions(source.data()).unwrap_or((0, 0));
    NormalizedImage {
        index,
        bytes: source.data().to_vec(),
        width,
        height,
        byte_size: source.len(),
        media_type: source.media_type(),
        color_model: ColorModel::Rgb,
        degradation: Some(degradation),
    }
}
