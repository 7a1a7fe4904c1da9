// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared test fixtures.

use heftwerk_core::{ColorModel, MediaType, NormalizedImage, ProcessingPolicy, RawImageSource};
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::image::{ImageProcessor, Normalize};

/// Small JPEG whose colour depends on `seed`, so pages can be told apart.
pub(crate) fn tiny_jpeg(seed: usize, width: u32, height: u32) -> Vec<u8> {
    let shade = (seed * 37 % 256) as u8;
    let img = RgbImage::from_pixel(width, height, Rgb([shade, 255 - shade, 128]));
    ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(img))
        .to_jpeg_bytes(70, ColorModel::Rgb)
        .unwrap()
}

/// PNG with a horizontal gradient.
pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| Rgb([(x * 40) as u8, 90, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Normalizer that ignores the source and emits an 8x8 JPEG per index.
pub(crate) struct StubNormalizer;

impl Normalize for StubNormalizer {
    fn normalize(&self, _: &RawImageSource, _: &ProcessingPolicy, index: usize) -> NormalizedImage {
        let bytes = tiny_jpeg(index, 8, 8);
        NormalizedImage {
            index,
            byte_size: bytes.len(),
            bytes,
            width: 8,
            height: 8,
            media_type: MediaType::Jpeg,
            color_model: ColorModel::Rgb,
            degradation: None,
        }
    }
}
