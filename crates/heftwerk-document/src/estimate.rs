// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quality/dimension tiers and final document size prediction.
//
// More photos means lower per-page fidelity, which keeps the finished PDF
// roughly inside the upload budget no matter how many pages are captured.

use heftwerk_core::ProcessingPolicy;
use serde::Serialize;

/// Fixed PDF overhead (catalog, page tree, content streams) in megabytes.
const BASE_OVERHEAD_MB: f64 = 0.5;
/// Bytes per pixel before compression (RGB).
const BYTES_PER_PIXEL: f64 = 3.0;
/// Empirical JPEG factor applied on top of the quality setting.
const COMPRESSION_FACTOR: f64 = 0.8;
const BYTES_PER_MB: f64 = 1_048_576.0;

/// `(exclusive lower bound on image count, quality, target width)`, highest first.
const TIERS: [(usize, f32, u32); 4] = [
    (30, 0.60, 900),
    (20, 0.70, 1100),
    (12, 0.75, 1300),
    (6, 0.82, 1500),
];
const DEFAULT_TIER: (f32, u32) = (0.88, 1700);

/// Pick the processing policy for a run of `image_count` images.
///
/// Quality and width never increase as the count grows. A count of zero
/// gets the default tier.
pub fn estimate(image_count: usize) -> ProcessingPolicy {
    let (quality, width) = TIERS
        .iter()
        .find(|(above, _, _)| image_count > *above)
        .map(|&(_, quality, width)| (quality, width))
        .unwrap_or(DEFAULT_TIER);
    ProcessingPolicy::new(quality, width)
}

/// Predicted size of one normalized image in megabytes.
pub fn estimate_image_size(policy: &ProcessingPolicy) -> f64 {
    let pixels = policy.target_width as f64 * policy.target_height as f64;
    pixels * BYTES_PER_PIXEL * policy.quality as f64 * COMPRESSION_FACTOR / BYTES_PER_MB
}

/// Predicted size of the finished document in megabytes. Advisory only.
pub fn estimate_size(image_count: usize, policy: &ProcessingPolicy) -> f64 {
    BASE_OVERHEAD_MB + image_count as f64 * estimate_image_size(policy)
}

/// Size guidance shown to the user before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeEstimate {
    pub image_count: usize,
    pub policy: ProcessingPolicy,
    pub per_image_megabytes: f64,
    pub megabytes: f64,
}

impl SizeEstimate {
    pub fn for_count(image_count: usize) -> Self {
        let policy = estimate(image_count);
        Self {
            image_count,
            policy,
            per_image_megabytes: estimate_image_size(&policy),
            megabytes: estimate_size(image_count, &policy),
        }
    }
}
