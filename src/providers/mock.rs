/*!
 * Mock backend for tests and benchmarks.
 *
 * - `MockBackend::working()` - prefixes every line with the target language
 * - `MockBackend::wrong_count()` - drops the last line of every batch
 * - `MockBackend::failing()` - always fails with a connection error
 * - `MockBackend::slow(ms)` - works, after a delay
 * - `MockBackend::intermittent(n)` - fails every nth call
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{BatchLimits, TranslationBackend};
use crate::errors::ProviderError;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Returns one line less than it was given
    WrongCount,
    /// Always fails
    Failing,
    /// Succeeds after sleeping
    Slow { delay_ms: u64 },
    /// Fails on every `fail_every`th call
    Intermittent { fail_every: usize },
}

/// Scripted translation backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    behavior: MockBehavior,
    limits: BatchLimits,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new(name: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            limits: BatchLimits::new(2000, 50),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new("mock-working", MockBehavior::Working)
    }

    pub fn wrong_count() -> Self {
        Self::new("mock-wrong-count", MockBehavior::WrongCount)
    }

    pub fn failing() -> Self {
        Self::new("mock-failing", MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new("mock-slow", MockBehavior::Slow { delay_ms })
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new("mock-intermittent", MockBehavior::Intermittent { fail_every })
    }

    pub fn with_limits(mut self, max_chars: usize, max_entries: usize) -> Self {
        self.limits = BatchLimits::new(max_chars, max_entries);
        self
    }

    /// Number of `translate_batch` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared call counter, still readable after the backend is boxed
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// The line the working mode produces for `text`
    pub fn translated(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn limits(&self) -> BatchLimits {
        self.limits
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let translate_all = || {
            texts
                .iter()
                .map(|t| Self::translated(t, target_language))
                .collect::<Vec<_>>()
        };

        match self.behavior {
            MockBehavior::Working => Ok(translate_all()),
            MockBehavior::WrongCount => {
                let mut lines = translate_all();
                lines.pop();
                Ok(lines)
            }
            MockBehavior::Failing => Err(ProviderError::ConnectionError("mock backend is down".to_string())),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(translate_all())
            }
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && call % fail_every == 0 {
                    Err(ProviderError::RateLimitExceeded(format!("mock call {}", call)))
                } else {
                    Ok(translate_all())
                }
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("mock backend is down".to_string())),
            _ => Ok(()),
        }
    }
}
