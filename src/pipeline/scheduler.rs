/*!
 * Page scheduling across a bounded worker budget.
 *
 * The scheduler drives the pending page set through the translator, either
 * sequentially (one worker, optional courtesy delay between pages) or in
 * parallel under a semaphore-bounded pool. Completion order in parallel
 * mode is unordered; index order is restored downstream by the reassembler.
 * Every processed page, success or failure, fires exactly one progress
 * callback, and a success is written through to the cache before its
 * callback fires.
 */

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use tokio::sync::Semaphore;

use crate::document::{PageFailure, PageTranslation, PageUnit};
use crate::errors::CacheError;
use crate::pipeline::cache_store::CacheStore;
use crate::translator::PageTranslator;

/// Outcome of processing one page, delivered to the progress observer
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// The page translated successfully and is already in the cache
    Translated(PageTranslation),
    /// All retries for the page were exhausted
    Failed(PageFailure),
}

/// Progress observer invoked once per processed page with
/// `(pages_processed_so_far, total_pages_in_document, outcome)`.
///
/// The observer must not block significantly or it stalls the worker that
/// invokes it.
pub type ProgressFn = Arc<dyn Fn(usize, usize, &PageOutcome) + Send + Sync>;

/// Cooperative cancellation signal shared between an operator-facing handler
/// and the scheduler.
///
/// Raising the flag stops new pages from starting; pages already in flight
/// are allowed to finish. This is best-effort graceful shutdown, not
/// instantaneous cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create a new, unraised flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether the flag has been raised
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one scheduler pass over the pending set
#[derive(Debug, Default)]
pub struct SchedulerReport {
    /// Number of pages translated and cached during this pass
    pub translated: usize,

    /// Pages whose translation permanently failed during this pass
    pub failures: Vec<PageFailure>,

    /// Whether the pass stopped early on a cancellation signal
    pub interrupted: bool,
}

/// Drives pending pages through the translator under a concurrency budget
pub struct Scheduler {
    /// Worker budget; 1 selects sequential mode
    workers: usize,

    /// Courtesy delay between pages in sequential mode, applied after every
    /// page except the last
    sleep_between: Duration,
}

impl Scheduler {
    /// Create a scheduler with the given worker budget and courtesy delay
    pub fn new(workers: usize, sleep_between: Duration) -> Self {
        Self {
            workers: workers.max(1),
            sleep_between,
        }
    }

    /// Process the pending pages, writing successes through the cache and
    /// reporting each processed page to the progress observer.
    ///
    /// `total_pages` is the full document size and `processed_offset` the
    /// number of pages already cached before this pass, so the observer's
    /// tally reaches `total_pages` on a clean finish of a resumed run.
    pub async fn run(
        &self,
        pending: Vec<PageUnit>,
        total_pages: usize,
        processed_offset: usize,
        translator: Arc<dyn PageTranslator>,
        cache: &CacheStore,
        cancel: &CancellationFlag,
        progress: Option<ProgressFn>,
    ) -> Result<SchedulerReport, CacheError> {
        if pending.is_empty() {
            return Ok(SchedulerReport::default());
        }

        debug!(
            "Scheduling {} pending pages across {} worker(s)",
            pending.len(),
            self.workers
        );

        if self.workers <= 1 {
            self.run_sequential(
                pending,
                total_pages,
                processed_offset,
                translator,
                cache,
                cancel,
                progress,
            )
            .await
        } else {
            self.run_parallel(
                pending,
                total_pages,
                processed_offset,
                translator,
                cache,
                cancel,
                progress,
            )
            .await
        }
    }

    /// Sequential mode: pages in index order, one at a time
    #[allow(clippy::too_many_arguments)]
    async fn run_sequential(
        &self,
        pending: Vec<PageUnit>,
        total_pages: usize,
        processed_offset: usize,
        translator: Arc<dyn PageTranslator>,
        cache: &CacheStore,
        cancel: &CancellationFlag,
        progress: Option<ProgressFn>,
    ) -> Result<SchedulerReport, CacheError> {
        let mut report = SchedulerReport::default();
        let mut processed = processed_offset;
        let pending_count = pending.len();

        for (position, unit) in pending.into_iter().enumerate() {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }

            let outcome = match translator.translate(&unit).await {
                Ok(translation) => {
                    cache.upsert(translation.clone())?;
                    report.translated += 1;
                    PageOutcome::Translated(translation)
                }
                Err(e) => {
                    let failure = PageFailure {
                        index: unit.index,
                        error: e.to_string(),
                    };
                    warn!("Page {} failed: {}", failure.index, failure.error);
                    report.failures.push(failure.clone());
                    PageOutcome::Failed(failure)
                }
            };

            processed += 1;
            if let Some(callback) = &progress {
                callback(processed, total_pages, &outcome);
            }

            let is_last = position + 1 == pending_count;
            if !self.sleep_between.is_zero() && !is_last {
                tokio::time::sleep(self.sleep_between).await;
            }
        }

        Ok(report)
    }

    /// Parallel mode: pages submitted to a semaphore-bounded pool, results
    /// handled in completion order
    #[allow(clippy::too_many_arguments)]
    async fn run_parallel(
        &self,
        pending: Vec<PageUnit>,
        total_pages: usize,
        processed_offset: usize,
        translator: Arc<dyn PageTranslator>,
        cache: &CacheStore,
        cancel: &CancellationFlag,
        progress: Option<ProgressFn>,
    ) -> Result<SchedulerReport, CacheError> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let processed = Arc::new(AtomicUsize::new(processed_offset));
        let submitted = pending.len();

        let outcomes: Vec<Result<Option<PageOutcome>, CacheError>> =
            stream::iter(pending.into_iter())
                .map(|unit| {
                    let translator = Arc::clone(&translator);
                    let semaphore = Arc::clone(&semaphore);
                    let processed = Arc::clone(&processed);
                    let progress = progress.clone();
                    let cancel = cancel.clone();

                    async move {
                        // Acquire a permit from the semaphore
                        let _permit = semaphore.acquire().await.unwrap();

                        // Once cancellation is signaled, no new page starts;
                        // pages already past this point run to completion.
                        if cancel.is_cancelled() {
                            return Ok(None);
                        }

                        let outcome = match translator.translate(&unit).await {
                            Ok(translation) => {
                                // Upsert before the callback so an observer
                                // querying the cache after being notified
                                // always sees the entry
                                cache.upsert(translation.clone())?;
                                PageOutcome::Translated(translation)
                            }
                            Err(e) => {
                                let failure = PageFailure {
                                    index: unit.index,
                                    error: e.to_string(),
                                };
                                warn!("Page {} failed: {}", failure.index, failure.error);
                                PageOutcome::Failed(failure)
                            }
                        };

                        let tally = processed.fetch_add(1, Ordering::SeqCst) + 1;
                        if let Some(callback) = &progress {
                            callback(tally, total_pages, &outcome);
                        }

                        Ok(Some(outcome))
                    }
                })
                .buffer_unordered(self.workers)
                .collect()
                .await;

        let mut report = SchedulerReport::default();
        let mut skipped = 0usize;
        for outcome in outcomes {
            match outcome? {
                Some(PageOutcome::Translated(_)) => report.translated += 1,
                Some(PageOutcome::Failed(failure)) => report.failures.push(failure),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("{} of {} pages skipped after cancellation", skipped, submitted);
        }
        report.interrupted = cancel.is_cancelled();
        report.failures.sort_by_key(|failure| failure.index);

        Ok(report)
    }
}
