/*!
 * Resumable parallel translation pipeline.
 *
 * This module contains the core of the application: the retry wrapper, the
 * durable page cache, the scheduler that fans pending pages out across a
 * worker budget, the orchestrator that owns an end-to-end run, and the
 * reassembler that restores index order over out-of-order completions.
 */

pub mod cache_store;
pub mod orchestrator;
pub mod reassemble;
pub mod retry;
pub mod scheduler;

pub use cache_store::CacheStore;
pub use orchestrator::{PipelineOutput, TranslationPipeline};
pub use reassemble::reassemble;
pub use retry::RetryPolicy;
pub use scheduler::{CancellationFlag, PageOutcome, ProgressFn, Scheduler, SchedulerReport};
