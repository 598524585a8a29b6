/*!
 * End-to-end tests for the translation pipeline orchestrator
 */

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use doctran::document::{PageTranslation, PageUnit};
use doctran::errors::{AppError, TranslateError};
use doctran::pipeline::{CacheStore, TranslationPipeline};
use doctran::translator::mock::MockTranslator;
use doctran::translator::PageTranslator;
use doctran::RetryPolicy;

use crate::common::{text_units, ProgressRecorder};

/// Wraps a translator in a retry policy the way the production translators
/// wrap their provider calls
struct RetryingTranslator {
    inner: Arc<MockTranslator>,
    retry: RetryPolicy,
}

#[async_trait]
impl PageTranslator for RetryingTranslator {
    async fn translate(&self, unit: &PageUnit) -> Result<PageTranslation, TranslateError> {
        let op_name = format!("translate page {}", unit.index);
        self.retry.run(&op_name, || self.inner.translate(unit)).await
    }
}

fn pipeline_at(
    cache_path: impl AsRef<Path>,
    translator: Arc<dyn PageTranslator>,
    workers: usize,
) -> TranslationPipeline {
    TranslationPipeline::new(
        translator,
        CacheStore::new(cache_path.as_ref().to_path_buf()),
        workers,
        Duration::ZERO,
    )
}

fn disk_record(path: impl AsRef<Path>) -> BTreeMap<String, PageTranslation> {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn test_pipeline_run_withOnePermanentFailure_shouldMatchReferenceScenario() {
    // full_range=[1,2,3], page 2 fails permanently
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");
    let (_, translator) = MockTranslator::failing_for([2]).shared();
    let pipeline = pipeline_at(&cache_path, translator, 1);
    let recorder = ProgressRecorder::new();

    let output = pipeline
        .run(text_units(3), false, Some(recorder.callback()))
        .await
        .unwrap();

    // Final output holds pages 1 and 3 only, in order
    let indices: Vec<u32> = output.pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 3]);
    assert!(!output.is_complete(3));
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].index, 2);

    // Cache on disk contains keys "1" and "3" only
    let record = disk_record(&cache_path);
    assert_eq!(
        record.keys().cloned().collect::<Vec<_>>(),
        vec!["1".to_string(), "3".to_string()]
    );

    // Progress fired 3 times (2 successes + 1 failure), tally reaching 3
    let events = recorder.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events.iter().filter(|e| e.success).count(), 2);
    assert_eq!(events.last().unwrap().processed, 3);
}

#[tokio::test]
async fn test_pipeline_run_withResume_shouldNeverRetranslateCachedPages() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    let (first_mock, translator) = MockTranslator::working().shared();
    let first = pipeline_at(&cache_path, translator, 2);
    let output = first.run(text_units(4), false, None).await.unwrap();
    assert!(output.is_complete(4));
    assert_eq!(first_mock.total_calls(), 4);

    // A second resumed run finds everything cached and translates nothing
    let (second_mock, translator) = MockTranslator::working().shared();
    let second = pipeline_at(&cache_path, translator, 2);
    let output = second.run(text_units(4), true, None).await.unwrap();

    assert!(output.is_complete(4));
    assert_eq!(second_mock.total_calls(), 0);
}

#[tokio::test]
async fn test_pipeline_run_withRepeatedResume_shouldBeIdempotent() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    let (_, translator) = MockTranslator::working().shared();
    let pipeline = pipeline_at(&cache_path, translator, 2);
    pipeline.run(text_units(5), false, None).await.unwrap();

    let (_, translator) = MockTranslator::working().shared();
    let pipeline = pipeline_at(&cache_path, translator, 2);
    let first = pipeline.run(text_units(5), true, None).await.unwrap();
    let second = pipeline.run(text_units(5), true, None).await.unwrap();

    assert_eq!(first.pages, second.pages);
}

#[tokio::test]
async fn test_pipeline_run_withPartialFirstRun_shouldCompleteOnResume() {
    // Simulated crash: the first run permanently fails pages 3..5, leaving
    // exactly 2 of 5 results persisted
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    let (_, translator) = MockTranslator::failing_for([3, 4, 5]).shared();
    let pipeline = pipeline_at(&cache_path, translator, 2);
    let output = pipeline.run(text_units(5), false, None).await.unwrap();
    assert_eq!(output.pages.len(), 2);
    assert_eq!(disk_record(&cache_path).len(), 2);

    // The resumed run retries only the missing pages and completes the set
    let (mock, translator) = MockTranslator::working().shared();
    let pipeline = pipeline_at(&cache_path, translator, 2);
    let output = pipeline.run(text_units(5), true, None).await.unwrap();

    assert!(output.is_complete(5));
    assert_eq!(mock.total_calls(), 3);
    assert_eq!(mock.calls_for(1), 0);
    assert_eq!(mock.calls_for(2), 0);
    let indices: Vec<u32> = output.pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pipeline_run_withParallelWorkers_shouldReassembleInIndexOrder() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    // Per-call delays shuffle completion order across workers
    let (_, translator) = MockTranslator::working()
        .with_delay(Duration::from_millis(3))
        .shared();
    let pipeline = pipeline_at(&cache_path, translator, 4);
    let output = pipeline.run(text_units(12), false, None).await.unwrap();

    let indices: Vec<u32> = output.pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_pipeline_run_withCorruptCache_shouldFailLoudlyOnResume() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");
    std::fs::write(&cache_path, "definitely not json").unwrap();

    let (mock, translator) = MockTranslator::working().shared();
    let pipeline = pipeline_at(&cache_path, translator, 1);
    let error = pipeline.run(text_units(3), true, None).await.unwrap_err();

    assert!(matches!(error, AppError::Cache(_)));
    // Nothing was translated before the failure surfaced
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_pipeline_run_withTransientFailures_shouldRecoverViaRetry() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    // Each page rate-limits twice before succeeding; the retry budget of 2
    // covers exactly that
    let mock = Arc::new(MockTranslator::flaky(2));
    let translator: Arc<dyn PageTranslator> = Arc::new(RetryingTranslator {
        inner: Arc::clone(&mock),
        retry: RetryPolicy::new(2, Duration::from_millis(1), 2.0),
    });
    let pipeline = pipeline_at(&cache_path, translator, 1);

    let output = pipeline.run(text_units(3), false, None).await.unwrap();

    assert!(output.is_complete(3));
    assert!(output.failures.is_empty());
    // Two failed attempts plus the success, per page
    assert_eq!(mock.calls_for(1), 3);
    assert_eq!(mock.calls_for(3), 3);
    assert_eq!(disk_record(&cache_path).len(), 3);
}

#[tokio::test]
async fn test_pipeline_run_withAlwaysFailingTranslator_shouldFailEveryPage() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    let (mock, translator) = MockTranslator::failing().shared();
    let pipeline = pipeline_at(&cache_path, translator, 2);
    let output = pipeline.run(text_units(4), false, None).await.unwrap();

    assert!(output.pages.is_empty());
    assert_eq!(output.failures.len(), 4);
    assert_eq!(mock.total_calls(), 4);
    assert!(disk_record(&cache_path).is_empty());
}

#[tokio::test]
async fn test_pipeline_run_withEmptyTranslations_shouldReportFailuresNotSuccesses() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    let (_, translator) = MockTranslator::empty().shared();
    let pipeline = pipeline_at(&cache_path, translator, 1);
    let output = pipeline.run(text_units(2), false, None).await.unwrap();

    assert!(output.pages.is_empty());
    assert_eq!(output.failures.len(), 2);
}

#[tokio::test]
async fn test_pipeline_run_withCancellation_shouldFlushCompletedWork() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    let (_, translator) = MockTranslator::working().shared();
    let pipeline = pipeline_at(&cache_path, translator, 1);
    pipeline.cancellation_flag().cancel();

    let output = pipeline.run(text_units(4), false, None).await.unwrap();

    assert!(output.interrupted);
    assert!(output.pages.is_empty());
    // The record exists on disk even though nothing completed
    assert!(cache_path.exists());
    assert!(disk_record(&cache_path).is_empty());
}

#[tokio::test]
async fn test_pipeline_run_withZeroPages_shouldReturnEmptyOutput() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache.json");

    let (mock, translator) = MockTranslator::working().shared();
    let pipeline = pipeline_at(&cache_path, translator, 3);
    let output = pipeline.run(Vec::new(), false, None).await.unwrap();

    assert!(output.pages.is_empty());
    assert!(output.failures.is_empty());
    assert!(!output.interrupted);
    assert_eq!(mock.total_calls(), 0);
}
