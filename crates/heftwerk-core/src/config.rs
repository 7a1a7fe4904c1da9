// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HeftwerkError, Result};
use crate::types::MediaType;

/// Upper bound for the automatically chosen worker pool size.
const MAX_DEFAULT_WORKERS: usize = 4;

/// Settings for one capture-to-PDF pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Images normalized concurrently before the next batch starts (default 3).
    pub batch_size: usize,
    /// Try to normalize on a background worker pool. Falls back to inline
    /// execution when the pool cannot be created.
    pub use_worker_pool: bool,
    /// Pool size; `None` picks the available parallelism, capped at 4.
    pub worker_threads: Option<usize>,
    /// Per-image deadline for a pool worker before the item is redone inline.
    pub worker_timeout_ms: u64,
    /// Pause between batches so the host can repaint. 0 only yields.
    pub batch_pause_ms: u64,
    /// Resampling filter used when stretching images onto the page canvas.
    pub resize_filter: ResizeFilter,
    /// Title written into the PDF metadata.
    pub document_title: String,
    /// Checks applied to standalone uploads.
    pub upload: UploadRules,
    /// Re-compression applied to standalone image uploads.
    pub draft: DraftCompression,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            use_worker_pool: true,
            worker_threads: None,
            worker_timeout_ms: 30_000,
            batch_pause_ms: 10,
            resize_filter: ResizeFilter::Lanczos3,
            document_title: "Scanned Document".into(),
            upload: UploadRules::default(),
            draft: DraftCompression::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(HeftwerkError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(HeftwerkError::InvalidConfig(
                "worker_threads must be at least 1 when set".into(),
            ));
        }
        if self.worker_timeout_ms == 0 {
            return Err(HeftwerkError::InvalidConfig(
                "worker_timeout_ms must be greater than 0".into(),
            ));
        }
        if !(self.draft.quality > 0.0 && self.draft.quality <= 1.0) {
            return Err(HeftwerkError::InvalidConfig(format!(
                "draft.quality must be in (0, 1], got {}",
                self.draft.quality
            )));
        }
        if self.draft.max_dimension == 0 {
            return Err(HeftwerkError::InvalidConfig(
                "draft.max_dimension must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Worker pool size after applying the default.
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_DEFAULT_WORKERS)
        })
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_timeout_ms)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Resampling filters offered for the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Lanczos3,
}

/// Size and type limits for a single uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadRules {
    pub max_size_bytes: u64,
    pub allowed_types: Vec<MediaType>,
}

impl Default for UploadRules {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            allowed_types: vec![
                MediaType::Jpeg,
                MediaType::Png,
                MediaType::Webp,
                MediaType::Pdf,
            ],
        }
    }
}

/// Generic resize/quality reduction for standalone draft uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftCompression {
    /// Longest edge after resizing, in pixels. Smaller images are not upscaled.
    pub max_dimension: u32,
    /// JPEG quality in (0, 1].
    pub quality: f32,
}

impl Default for DraftCompression {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            quality: 0.8,
        }
    }
}
