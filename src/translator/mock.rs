/*!
 * Mock translator implementations for testing.
 *
 * The mock simulates the behaviors the pipeline must contain:
 * - `MockTranslator::working()` - always succeeds
 * - `MockTranslator::failing()` - always fails
 * - `MockTranslator::failing_for(indices)` - fails only for given pages
 * - `MockTranslator::flaky(n)` - fails the first n calls per page, then succeeds
 * - `MockTranslator::empty()` - reports an empty translation for every page
 */

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::document::{PageContent, PageTranslation, PageUnit};
use crate::errors::{ProviderError, TranslateError};
use crate::translator::PageTranslator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeeds with a tagged translation
    Working,
    /// Always fails with a provider error
    Failing,
    /// Fails permanently for the given page indices, succeeds otherwise
    FailingFor(BTreeSet<u32>),
    /// Fails the first `fail_first` calls for each page, then succeeds
    Flaky {
        /// Number of failures before the first success, per page
        fail_first: usize,
    },
    /// Reports an empty translation for every page
    Empty,
}

/// Mock page translator with per-page call counting
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total number of translate calls
    total_calls: AtomicUsize,
    /// Per-page call counts
    calls_per_page: Mutex<HashMap<u32, usize>>,
    /// Optional artificial delay per call, for exercising completion order
    delay: Option<Duration>,
}

impl MockTranslator {
    /// Create a mock with the given behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            total_calls: AtomicUsize::new(0),
            calls_per_page: Mutex::new(HashMap::new()),
            delay: None,
        }
    }

    /// Mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Mock that always fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Mock that fails permanently for the given page indices
    pub fn failing_for(indices: impl IntoIterator<Item = u32>) -> Self {
        Self::new(MockBehavior::FailingFor(indices.into_iter().collect()))
    }

    /// Mock that fails the first `fail_first` calls per page, then succeeds
    pub fn flaky(fail_first: usize) -> Self {
        Self::new(MockBehavior::Flaky { fail_first })
    }

    /// Mock that reports an empty translation for every page
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Add an artificial per-call delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wrap in the `Arc<dyn PageTranslator>` the pipeline expects
    pub fn shared(self) -> (Arc<Self>, Arc<dyn PageTranslator>) {
        let mock = Arc::new(self);
        let translator: Arc<dyn PageTranslator> = Arc::clone(&mock) as _;
        (mock, translator)
    }

    /// Total number of translate calls observed
    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Number of translate calls observed for one page
    pub fn calls_for(&self, index: u32) -> usize {
        self.calls_per_page.lock().get(&index).copied().unwrap_or(0)
    }

    fn record_call(&self, index: u32) -> usize {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let mut per_page = self.calls_per_page.lock();
        let count = per_page.entry(index).or_insert(0);
        *count += 1;
        *count
    }
}

#[async_trait]
impl PageTranslator for MockTranslator {
    async fn translate(&self, unit: &PageUnit) -> Result<PageTranslation, TranslateError> {
        let call_number = self.record_call(unit.index);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let original = match &unit.content {
            PageContent::Text(text) => text.clone(),
            PageContent::Image(_) => String::new(),
        };

        let succeed = |index: u32, original: String| PageTranslation {
            index,
            translated: format!("[translated] {}", original),
            original,
        };

        match &self.behavior {
            MockBehavior::Working => Ok(succeed(unit.index, original)),
            MockBehavior::Failing => Err(TranslateError::Provider(ProviderError::RequestFailed(
                format!("mock failure for page {}", unit.index),
            ))),
            MockBehavior::FailingFor(indices) => {
                if indices.contains(&unit.index) {
                    Err(TranslateError::Provider(ProviderError::RequestFailed(
                        format!("mock failure for page {}", unit.index),
                    )))
                } else {
                    Ok(succeed(unit.index, original))
                }
            }
            MockBehavior::Flaky { fail_first } => {
                if call_number <= *fail_first {
                    Err(TranslateError::Provider(ProviderError::RateLimitExceeded(
                        format!("mock rate limit on call {} for page {}", call_number, unit.index),
                    )))
                } else {
                    Ok(succeed(unit.index, original))
                }
            }
            MockBehavior::Empty => Err(TranslateError::EmptyTranslation { index: unit.index }),
        }
    }
}
