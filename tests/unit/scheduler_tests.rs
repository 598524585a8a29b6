/*!
 * Tests for the page scheduler
 */

use std::sync::Arc;
use std::time::Duration;

use doctran::pipeline::{CacheStore, CancellationFlag, PageOutcome, ProgressFn, Scheduler};
use doctran::translator::mock::MockTranslator;

use crate::common::{text_units, ProgressRecorder};

fn store_in(dir: &tempfile::TempDir) -> CacheStore {
    CacheStore::new(dir.path().join("cache.json"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scheduler_run_withParallelWorkers_shouldProcessEveryPage() {
    let dir = tempfile::tempdir().unwrap();
    let cache = store_in(&dir);
    let (mock, translator) = MockTranslator::working()
        .with_delay(Duration::from_millis(5))
        .shared();
    let recorder = ProgressRecorder::new();

    let scheduler = Scheduler::new(4, Duration::ZERO);
    let report = scheduler
        .run(
            text_units(10),
            10,
            0,
            translator,
            &cache,
            &CancellationFlag::new(),
            Some(recorder.callback()),
        )
        .await
        .unwrap();

    assert_eq!(report.translated, 10);
    assert!(report.failures.is_empty());
    assert!(!report.interrupted);
    assert_eq!(mock.total_calls(), 10);
    assert_eq!(cache.len(), 10);

    // Exactly one progress event per processed page, tally monotone and
    // reaching the total
    let events = recorder.events();
    assert_eq!(events.len(), 10);
    let tallies: Vec<usize> = events.iter().map(|e| e.processed).collect();
    assert_eq!(tallies, (1..=10).collect::<Vec<_>>());
    assert!(events.iter().all(|e| e.total == 10));
}

#[tokio::test]
async fn test_scheduler_run_withSequentialMode_shouldPreserveIndexOrder() {
    let dir = tempfile::tempdir().unwrap();
    let cache = store_in(&dir);
    let (_, translator) = MockTranslator::working().shared();
    let recorder = ProgressRecorder::new();

    let scheduler = Scheduler::new(1, Duration::ZERO);
    scheduler
        .run(
            text_units(5),
            5,
            0,
            translator,
            &cache,
            &CancellationFlag::new(),
            Some(recorder.callback()),
        )
        .await
        .unwrap();

    let indices: Vec<u32> = recorder.events().iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_scheduler_run_withFailingPage_shouldContinueBatch() {
    let dir = tempfile::tempdir().unwrap();
    let cache = store_in(&dir);
    let (_, translator) = MockTranslator::failing_for([3]).shared();
    let recorder = ProgressRecorder::new();

    let scheduler = Scheduler::new(1, Duration::ZERO);
    let report = scheduler
        .run(
            text_units(5),
            5,
            0,
            translator,
            &cache,
            &CancellationFlag::new(),
            Some(recorder.callback()),
        )
        .await
        .unwrap();

    // Failures both count as processed and never abort the batch
    assert_eq!(report.translated, 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 3);
    assert_eq!(recorder.len(), 5);
    assert!(cache.get(3).is_none());
    assert_eq!(cache.cached_indices().into_iter().collect::<Vec<_>>(), vec![1, 2, 4, 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scheduler_run_withParallelWorkers_shouldUpsertBeforeCallback() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(store_in(&dir));
    let (_, translator) = MockTranslator::working()
        .with_delay(Duration::from_millis(2))
        .shared();

    // The observer queries the cache as soon as it is notified; the entry
    // must already be there
    let observed_cache = Arc::clone(&cache);
    let progress: ProgressFn = Arc::new(move |_, _, outcome| {
        if let PageOutcome::Translated(page) = outcome {
            assert!(
                observed_cache.get(page.index).is_some(),
                "page {} reported before its cache entry was visible",
                page.index
            );
        }
    });

    let scheduler = Scheduler::new(4, Duration::ZERO);
    let report = scheduler
        .run(
            text_units(8),
            8,
            0,
            translator,
            &cache,
            &CancellationFlag::new(),
            Some(progress),
        )
        .await
        .unwrap();

    assert_eq!(report.translated, 8);
}

#[tokio::test]
async fn test_scheduler_run_withRaisedCancellation_shouldStartNoPages() {
    let dir = tempfile::tempdir().unwrap();
    let cache = store_in(&dir);
    let (mock, translator) = MockTranslator::working().shared();

    let cancel = CancellationFlag::new();
    cancel.cancel();

    let scheduler = Scheduler::new(3, Duration::ZERO);
    let report = scheduler
        .run(text_units(6), 6, 0, translator, &cache, &cancel, None)
        .await
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.translated, 0);
    assert_eq!(mock.total_calls(), 0);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_scheduler_run_withProcessedOffset_shouldSeedTally() {
    let dir = tempfile::tempdir().unwrap();
    let cache = store_in(&dir);
    let (_, translator) = MockTranslator::working().shared();
    let recorder = ProgressRecorder::new();

    // Simulates a resume where 3 of 5 pages were already cached
    let scheduler = Scheduler::new(1, Duration::ZERO);
    scheduler
        .run(
            text_units(5).split_off(3),
            5,
            3,
            translator,
            &cache,
            &CancellationFlag::new(),
            Some(recorder.callback()),
        )
        .await
        .unwrap();

    let tallies: Vec<usize> = recorder.events().iter().map(|e| e.processed).collect();
    assert_eq!(tallies, vec![4, 5]);
}
