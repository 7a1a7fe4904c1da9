// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture pipeline — photographs in, one A4 PDF out.
//
// estimate -> batched normalization -> page assembly -> sealed buffer, with
// progress events along the way. Item-level trouble degrades single pages;
// only pipeline-level failures come back as errors.

pub mod dispatcher;
pub mod executor;

use std::sync::Arc;

use heftwerk_core::PipelineConfig;
use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::{ProcessingPolicy, RawImageSource};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub use dispatcher::BatchDispatcher;
pub use executor::{Dispatched, Executor, ExecutorLease, InlineExecutor, PooledExecutor};

use crate::estimate::{SizeEstimate, estimate};
use crate::image::Normalizer;
use crate::pdf::{DocumentBuffer, assemble};
use crate::progress::{ProgressCallback, ProgressReporter};

/// Entry point for turning captured images into a document.
///
/// A pipeline can be shared between tasks. Runs that share its worker pool
/// are serialised; each run still gets its own progress stream.
#[derive(Clone)]
pub struct CapturePipeline {
    config: Arc<PipelineConfig>,
    dispatcher: BatchDispatcher,
}

impl CapturePipeline {
    /// Validate `config` and set up the executor it asks for.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = Arc::new(Normalizer::new(config.resize_filter));
        let executor = Executor::from_config(&config, normalizer);
        Ok(Self::with_executor(config, executor))
    }

    /// Use a caller-supplied executor, e.g. one shared with other pipelines.
    pub fn with_executor(config: PipelineConfig, executor: Executor) -> Self {
        let dispatcher =
            BatchDispatcher::new(executor, config.batch_size).with_batch_pause(config.batch_pause());
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        self.dispatcher.executor()
    }

    /// Policy and predicted size for `image_count` images.
    pub fn estimate(&self, image_count: usize) -> SizeEstimate {
        SizeEstimate::for_count(image_count)
    }

    /// Build a document from `sources`, in order, one page each.
    ///
    /// Progress ends at 100 only when a document is returned.
    pub async fn run(
        &self,
        sources: Vec<RawImageSource>,
        progress: Option<ProgressCallback>,
    ) -> Result<DocumentBuffer> {
        let policy = estimate(sources.len());
        self.run_with_policy(sources, policy, progress).await
    }

    /// Like [`CapturePipeline::run`] but with an explicit policy instead of
    /// the count-based tier.
    pub async fn run_with_policy(
        &self,
        sources: Vec<RawImageSource>,
        policy: ProcessingPolicy,
        progress: Option<ProgressCallback>,
    ) -> Result<DocumentBuffer> {
        let run_id = Uuid::new_v4();
        let span = info_span!("capture_run", %run_id, images = sources.len());
        self.execute(sources, policy, ProgressReporter::new(progress))
            .instrument(span)
            .await
    }

    /// Run on a private single-threaded runtime.
    ///
    /// For synchronous callers only; calling this from inside a tokio runtime
    /// panics.
    pub fn run_blocking(
        &self,
        sources: Vec<RawImageSource>,
        progress: Option<ProgressCallback>,
    ) -> Result<DocumentBuffer> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(sources, progress))
    }

    async fn execute(
        &self,
        sources: Vec<RawImageSource>,
        policy: ProcessingPolicy,
        reporter: ProgressReporter,
    ) -> Result<DocumentBuffer> {
        if sources.is_empty() {
            return Err(HeftwerkError::NoImages);
        }

        let total = sources.len();
        reporter.run_started(total);
        info!(
            images = total,
            quality = policy.quality,
            width = policy.target_width,
            height = policy.target_height,
            pooled = self.executor().is_pooled(),
            "run started"
        );

        let images = self.dispatcher.run(sources, policy, &reporter).await?;
        let degraded = images.iter().filter(|image| image.is_degraded()).count();
        let document = assemble(images, &self.config.document_title, &reporter).await?;

        reporter.report(100.0, "Complete");
        info!(
            pages = document.page_count(),
            bytes = document.len(),
            degraded,
            "run finished"
        );
        Ok(document)
    }
}
