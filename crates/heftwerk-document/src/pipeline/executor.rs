// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Executors — where a normalize call actually runs.
//
// `PooledExecutor` hands each item to a rayon worker and awaits a oneshot
// reply bound to that one item. A worker that panics, drops the job or misses
// its deadline has the item redone inline on the calling thread.
// `InlineExecutor` runs the normalizer directly and is used when no pool is
// wanted or none could be built.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use heftwerk_core::PipelineConfig;
use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::{NormalizedImage, ProcessingPolicy, RawImageSource};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::{Mutex, OwnedMutexGuard, oneshot};
use tracing::{debug, info, warn};

use crate::image::Normalize;

/// Result of one dispatched item.
#[derive(Debug)]
pub struct Dispatched {
    pub image: NormalizedImage,
    /// Why the pool could not deliver, if the item was redone inline.
    pub worker_failure: Option<String>,
}

/// Exclusive use of an executor for the duration of one run.
///
/// Dropping the lease lets the next run start.
pub struct ExecutorLease {
    _guard: Option<OwnedMutexGuard<()>>,
}

/// Normalizes on the calling thread.
#[derive(Clone)]
pub struct InlineExecutor {
    normalizer: Arc<dyn Normalize>,
}

impl InlineExecutor {
    pub fn new(normalizer: Arc<dyn Normalize>) -> Self {
        Self { normalizer }
    }

    pub fn normalize(
        &self,
        source: &RawImageSource,
        policy: &ProcessingPolicy,
        index: usize,
    ) -> NormalizedImage {
        self.normalizer.normalize(source, policy, index)
    }
}

/// Reply sent back from a pool worker.
enum WorkerReply {
    Done(NormalizedImage),
    Crashed(String),
}

/// Normalizes on a bounded rayon pool, falling back inline per item.
#[derive(Clone)]
pub struct PooledExecutor {
    pool: Arc<ThreadPool>,
    threads: usize,
    /// Implementation run on the pool threads.
    worker: Arc<dyn Normalize>,
    /// Same contract, run on the caller when the worker fails.
    fallback: InlineExecutor,
    timeout: Duration,
    lease: Arc<Mutex<()>>,
}

impl PooledExecutor {
    /// Build a pool of `threads` workers.
    pub fn new(threads: usize, timeout: Duration, normalizer: Arc<dyn Normalize>) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("heftwerk-worker-{i}"))
            .panic_handler(|payload| {
                warn!(reason = %panic_message(payload.as_ref()), "pool worker panicked");
            })
            .build()
            .map_err(|err| HeftwerkError::WorkerPool(err.to_string()))?;

        info!(threads, ?timeout, "worker pool started");

        Ok(Self {
            pool: Arc::new(pool),
            threads,
            worker: Arc::clone(&normalizer),
            fallback: InlineExecutor::new(normalizer),
            timeout,
            lease: Arc::new(Mutex::new(())),
        })
    }

    /// Run a different implementation on the pool threads. The inline
    /// fallback keeps the normalizer given to [`PooledExecutor::new`].
    pub fn with_worker(mut self, worker: Arc<dyn Normalize>) -> Self {
        self.worker = worker;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn normalize(
        &self,
        source: Arc<RawImageSource>,
        policy: ProcessingPolicy,
        index: usize,
    ) -> Dispatched {
        match self.dispatch(Arc::clone(&source), policy, index).await {
            Ok(image) => Dispatched {
                image,
                worker_failure: None,
            },
            Err(reason) => {
                warn!(index, %reason, "worker failed, normalizing inline");
                Dispatched {
                    image: self.fallback.normalize(&source, &policy, index),
                    worker_failure: Some(reason),
                }
            }
        }
    }

    /// Send one item to the pool and wait for its own reply.
    async fn dispatch(
        &self,
        source: Arc<RawImageSource>,
        policy: ProcessingPolicy,
        index: usize,
    ) -> std::result::Result<NormalizedImage, String> {
        let (tx, rx) = oneshot::channel();
        let worker = Arc::clone(&self.worker);

        self.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                worker.normalize(&source, &policy, index)
            }));
            let reply = match outcome {
                Ok(image) => WorkerReply::Done(image),
                Err(payload) => WorkerReply::Crashed(panic_message(payload.as_ref())),
            };
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(reply);
        });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(WorkerReply::Done(image))) if image.index == index => {
                debug!(index, "worker finished");
                Ok(image)
            }
            Ok(Ok(WorkerReply::Done(image))) => Err(format!(
                "worker answered for index {} instead of {index}",
                image.index
            )),
            Ok(Ok(WorkerReply::Crashed(reason))) => Err(format!("worker crashed: {reason}")),
            Ok(Err(_)) => Err("worker dropped the job".into()),
            Err(_) => Err(format!("worker timed out after {:?}", self.timeout)),
        }
    }
}

/// The executor capability, chosen once at construction.
#[derive(Clone)]
pub enum Executor {
    Pooled(PooledExecutor),
    Inline(InlineExecutor),
}

impl Executor {
    /// Probe for a worker pool as configured; settle for inline execution
    /// when pooling is disabled or the pool cannot be built.
    pub fn from_config(config: &PipelineConfig, normalizer: Arc<dyn Normalize>) -> Self {
        if !config.use_worker_pool {
            debug!("worker pool disabled by configuration");
            return Self::inline(normalizer);
        }
        match PooledExecutor::new(
            config.effective_worker_threads(),
            config.worker_timeout(),
            Arc::clone(&normalizer),
        ) {
            Ok(pooled) => Self::Pooled(pooled),
            Err(err) => {
                warn!(%err, "worker pool unavailable, normalizing inline");
                Self::inline(normalizer)
            }
        }
    }

    pub fn inline(normalizer: Arc<dyn Normalize>) -> Self {
        Self::Inline(InlineExecutor::new(normalizer))
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }

    /// Wait until no other run is using this executor's pool.
    pub async fn acquire(&self) -> ExecutorLease {
        let guard = match self {
            Self::Pooled(pooled) => Some(Arc::clone(&pooled.lease).lock_owned().await),
            Self::Inline(_) => None,
        };
        ExecutorLease { _guard: guard }
    }

    pub async fn normalize(
        &self,
        source: Arc<RawImageSource>,
        policy: ProcessingPolicy,
        index: usize,
    ) -> Dispatched {
        match self {
            Self::Pooled(pooled) => pooled.normalize(source, policy, index).await,
            Self::Inline(inline) => Dispatched {
                image: inline.normalize(&source, &policy, index),
                worker_failure: None,
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
