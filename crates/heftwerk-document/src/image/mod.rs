// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — generic processing plus the per-page normalizer.

pub mod normalizer;
pub mod processor;

pub use normalizer::{Normalize, Normalizer};
pub use processor::ImageProcessor;
