// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting for a pipeline run.
//
// Budget: batches of normalization fill 0-50, page placement 50-75, the
// finalize step reports 90 and a sealed document reports 100. Callers treat
// a run that errors before 100 as failed.

use std::sync::{Arc, Mutex};

use heftwerk_core::ProgressState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Receives progress events as a run advances.
///
/// Implementations must be `Send + Sync`; a run may be driven from any tokio
/// worker thread. All methods default to no-ops.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called with every progress update, in non-decreasing percent order.
    fn on_progress(&self, state: &ProgressState) {
        let _ = state;
    }

    /// Called once when a run starts, before any image is touched.
    fn on_run_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called when an item had to be degraded or redone inline.
    fn on_item_warning(&self, index: usize, message: &str) {
        let _ = (index, message);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Stream form: every state is forwarded into an unbounded channel.
impl PipelineProgressCallback for UnboundedSender<ProgressState> {
    fn on_progress(&self, state: &ProgressState) {
        // A dropped receiver only means nobody is watching any more.
        let _ = self.send(state.clone());
    }
}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

/// Wraps an optional callback and keeps reported percentages monotonic.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last_percent: Mutex<f64>,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last_percent: Mutex::new(0.0),
        }
    }

    /// A reporter that drops every event.
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn run_started(&self, total_images: usize) {
        if let Some(cb) = &self.callback {
            cb.on_run_start(total_images);
        }
    }

    /// Report `percent` (clamped to 0-100 and to the last reported value).
    pub fn report(&self, percent: f64, step: impl Into<String>) {
        let percent = {
            let mut last = self
                .last_percent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let clamped = percent.clamp(0.0, 100.0).max(*last);
            *last = clamped;
            clamped
        };
        let state = ProgressState::new(percent, step);
        debug!(percent = state.percent, step = %state.step, "progress");
        if let Some(cb) = &self.callback {
            cb.on_progress(&state);
        }
    }

    pub fn item_warning(&self, index: usize, message: &str) {
        if let Some(cb) = &self.callback {
            cb.on_item_warning(index, message);
        }
    }

    /// Highest percentage reported so far.
    pub fn last_percent(&self) -> f64 {
        *self
            .last_percent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
