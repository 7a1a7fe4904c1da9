// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch dispatcher — normalize images in fixed-size batches, concurrently
// within a batch and strictly one batch after another, then hand the results
// back in capture order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::{NormalizedImage, ProcessingPolicy, RawImageSource};
use tracing::{debug, info, instrument, warn};

use super::executor::Executor;
use crate::progress::ProgressReporter;

/// Drives one run's normalization through an [`Executor`].
#[derive(Clone)]
pub struct BatchDispatcher {
    executor: Executor,
    batch_size: usize,
    batch_pause: Duration,
}

impl BatchDispatcher {
    pub fn new(executor: Executor, batch_size: usize) -> Self {
        Self {
            executor,
            batch_size: batch_size.max(1),
            batch_pause: Duration::ZERO,
        }
    }

    /// Pause between batches so the host can catch up. Zero only yields.
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Normalize every source and return one result per source, ordered by
    /// index.
    ///
    /// Reports `batches_done / total_batches * 50` after each batch.
    /// Decoded data only lives for the batch that produced it.
    #[instrument(skip_all, fields(images = sources.len(), batch_size = self.batch_size))]
    pub async fn run(
        &self,
        sources: Vec<RawImageSource>,
        policy: ProcessingPolicy,
        progress: &ProgressReporter,
    ) -> Result<Vec<NormalizedImage>> {
        let total = sources.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        // Hold the pool for the whole run; overlapping runs queue up here.
        let _lease = self.executor.acquire().await;

        let total_batches = total.div_ceil(self.batch_size);
        let mut pending = sources.into_iter().enumerate();
        let mut results: BTreeMap<usize, NormalizedImage> = BTreeMap::new();

        for batch_no in 1..=total_batches {
            let batch: Vec<(usize, RawImageSource)> =
                pending.by_ref().take(self.batch_size).collect();
            debug!(batch_no, items = batch.len(), "dispatching batch");

            let outcomes = join_all(batch.into_iter().map(|(index, source)| {
                self.executor.normalize(Arc::new(source), policy, index)
            }))
            .await;

            for outcome in outcomes {
                let index = outcome.image.index;
                if let Some(reason) = &outcome.worker_failure {
                    progress.item_warning(index, reason);
                }
                if let Some(degradation) = &outcome.image.degradation {
                    warn!(index, %degradation, "image degraded");
                    progress.item_warning(index, &degradation.to_string());
                }
                results.insert(index, outcome.image);
            }

            progress.report(
                batch_no as f64 / total_batches as f64 * 50.0,
                format!("Processed batch {batch_no} of {total_batches}"),
            );

            if batch_no < total_batches {
                self.pause().await;
            }
        }

        if results.len() != total || !results.keys().copied().eq(0..total) {
            return Err(HeftwerkError::Internal(format!(
                "expected {total} normalized images, got {}",
                results.len()
            )));
        }

        info!(images = total, batches = total_batches, "normalization complete");
        Ok(results.into_values().collect())
    }

    async fn pause(&self) {
        if self.batch_pause.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.batch_pause).await;
        }
    }
}
