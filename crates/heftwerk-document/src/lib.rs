// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// heftwerk-document — turns a stack of captured photographs into one A4 PDF.
//
// Provides the size/quality estimator, the per-page image normalizer, pooled
// and inline executors with a batch dispatcher, page layout and assembly,
// PDF inspection, and the upload guard for standalone files.

pub mod estimate;
pub mod guard;
pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod progress;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the primary types so callers can use `heftwerk_document::CapturePipeline` etc.
pub use estimate::{SizeEstimate, estimate, estimate_image_size, estimate_size};
pub use guard::{UploadFile, ValidationReport};
pub use image::{ImageProcessor, Normalize, Normalizer};
pub use pdf::{DocumentBuffer, DocumentBuilder, PageLayout, PdfReader, assemble};
pub use pipeline::{BatchDispatcher, CapturePipeline, Executor};
pub use progress::{
    NoopProgressCallback, PipelineProgressCallback, ProgressCallback, ProgressReporter,
};
