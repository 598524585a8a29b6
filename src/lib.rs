/*!
 * # doctran - AI document translation
 *
 * A Rust library for translating multi-page documents with AI, built around
 * a resumable parallel translation pipeline.
 *
 * ## Features
 *
 * - Translate text pages or scanned page images using vision models
 * - Parallel translation under a configurable worker budget
 * - Durable page cache: completed work survives crashes and interruptions
 * - Resume runs without re-translating cached pages
 * - Bounded exponential-backoff retry for transient provider failures
 * - Per-page failure containment: one failing page never aborts the batch
 * - Live progress reporting in completion order
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `pipeline`: the resumable parallel core:
 *   - `pipeline::retry`: bounded exponential-backoff retry
 *   - `pipeline::cache_store`: durable write-through page cache
 *   - `pipeline::scheduler`: sequential/parallel page execution
 *   - `pipeline::orchestrator`: end-to-end run composition
 *   - `pipeline::reassemble`: index-order output assembly
 * - `translator`: the page translation seam and its text/vision/mock
 *   implementations
 * - `providers`: OpenAI-compatible API client
 * - `document`: page-unit data model
 * - `ingest`: text and image-page ingestion collaborators
 * - `export`: text output writers
 * - `app_config`: configuration management
 * - `errors`: custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod document;
pub mod errors;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod providers;
pub mod translator;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{PageFailure, PageTranslation, PageUnit};
pub use errors::{AppError, CacheError, ProviderError, TranslateError};
pub use pipeline::{CacheStore, CancellationFlag, PipelineOutput, RetryPolicy, TranslationPipeline};
pub use translator::PageTranslator;
