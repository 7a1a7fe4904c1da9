// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Heftwerk.
//
// Only pipeline-level failures live here. A single bad photograph is never an
// error: it travels as a `Degradation` marker on its `NormalizedImage`.

use thiserror::Error;

/// Top-level error type for all Heftwerk operations.
#[derive(Debug, Error)]
pub enum HeftwerkError {
    // -- Pipeline errors --
    #[error("no images were supplied")]
    NoImages,

    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),

    #[error("internal pipeline error: {0}")]
    Internal(String),

    // -- Document errors --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HeftwerkError>;
