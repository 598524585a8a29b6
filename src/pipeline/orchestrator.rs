/*!
 * End-to-end pipeline orchestration.
 *
 * The orchestrator owns one run: it loads the cache when resuming, computes
 * the pending set, drives the scheduler, guarantees a cache flush on every
 * exit path, and reassembles the final ordered output. It is the single
 * entry point external callers use.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::document::{PageFailure, PageTranslation, PageUnit};
use crate::errors::AppError;
use crate::pipeline::cache_store::CacheStore;
use crate::pipeline::reassemble::reassemble;
use crate::pipeline::scheduler::{CancellationFlag, ProgressFn, Scheduler};
use crate::translator::PageTranslator;

/// Final result of a pipeline run
#[derive(Debug)]
pub struct PipelineOutput {
    /// Completed pages in ascending index order; indices that never
    /// completed are absent, so callers compare `pages.len()` against the
    /// requested page count to detect partial completion
    pub pages: Vec<PageTranslation>,

    /// Pages that permanently failed during this run
    pub failures: Vec<PageFailure>,

    /// Whether the run stopped early on a cancellation signal
    pub interrupted: bool,
}

impl PipelineOutput {
    /// Whether every requested page completed
    pub fn is_complete(&self, total_pages: usize) -> bool {
        self.pages.len() == total_pages
    }
}

/// Composes the cache store, scheduler, and reassembler into one run
pub struct TranslationPipeline {
    /// Injected page translator; shared across workers
    translator: Arc<dyn PageTranslator>,

    /// Durable cache backing resume
    cache: CacheStore,

    /// Page execution driver
    scheduler: Scheduler,

    /// Cooperative cancellation signal
    cancel: CancellationFlag,
}

impl TranslationPipeline {
    /// Create a pipeline over the given translator and cache record path
    pub fn new(
        translator: Arc<dyn PageTranslator>,
        cache: CacheStore,
        workers: usize,
        sleep_between: Duration,
    ) -> Self {
        Self {
            translator,
            cache,
            scheduler: Scheduler::new(workers, sleep_between),
            cancel: CancellationFlag::new(),
        }
    }

    /// Handle for signaling a graceful interruption of the current run
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Read access to the backing cache store
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Translate the document's pages, resuming from the cache when asked.
    ///
    /// The cache is flushed before returning on every outcome: normal
    /// completion, cancellation, and errors bubbling from the scheduler.
    pub async fn run(
        &self,
        units: Vec<PageUnit>,
        resume: bool,
        progress: Option<ProgressFn>,
    ) -> Result<PipelineOutput, AppError> {
        let total_pages = units.len();

        if resume {
            let cached = self.cache.load()?;
            if cached > 0 {
                info!("Resuming: {} of {} pages already translated", cached, total_pages);
            }
        } else {
            self.cache.clear();
        }

        // The pending set is computed once, single-threaded, before any
        // worker starts; cached indices are never re-translated
        let cached_indices = self.cache.cached_indices();
        let pending: Vec<PageUnit> = units
            .into_iter()
            .filter(|unit| !cached_indices.contains(&unit.index))
            .collect();

        info!(
            "Translating {} of {} pages ({} cached)",
            pending.len(),
            total_pages,
            cached_indices.len()
        );

        let mut failures = Vec::new();
        let mut interrupted = false;

        if pending.is_empty() {
            debug!("Nothing pending, skipping straight to reassembly");
        } else {
            let scheduled = self
                .scheduler
                .run(
                    pending,
                    total_pages,
                    cached_indices.len(),
                    Arc::clone(&self.translator),
                    &self.cache,
                    &self.cancel,
                    progress,
                )
                .await;

            // Flush before inspecting the scheduler outcome so completed
            // work is durable even when the pass errored or was interrupted
            let flushed = self.cache.flush();

            let report = scheduled?;
            flushed?;

            failures = report.failures;
            interrupted = report.interrupted;

            if interrupted {
                info!(
                    "Run interrupted; {} pages completed and persisted",
                    self.cache.len()
                );
            }
        }

        let snapshot = self.cache.snapshot();
        let pages = reassemble(total_pages, &snapshot);

        Ok(PipelineOutput {
            pages,
            failures,
            interrupted,
        })
    }
}
