/*!
 * Mock provider implementation for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, one translation per input
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::wrong_count()` - Succeeds but drops the last translation
 * - `MockProvider::panicking()` - Panics inside the call
 *
 * `with_script` overrides the behavior for the first calls, which is how
 * "fail twice, then succeed" scenarios are written. Every call is recorded
 * with its (tokio) start time so backoff delays can be asserted.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, Instant};

use crate::app_config::ProviderKind;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Behavior mode for a single mock call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Translate every text
    Working,
    /// Fail with an API error
    Failing,
    /// Return one translation fewer than requested
    WrongCount,
    /// Panic inside the call
    Panicking,
    /// Sleep before translating
    Slow { delay_ms: u64 },
}

/// A recorded call
#[derive(Debug, Clone)]
pub struct MockCall {
    /// When the call started
    pub at: Instant,
    /// Texts received
    pub texts: Vec<String>,
}

type Translator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Mock provider for testing orchestration behavior
pub struct MockProvider {
    kind: ProviderKind,
    behavior: MockBehavior,
    script: Arc<Mutex<VecDeque<MockBehavior>>>,
    translator: Translator,
    calls: Arc<Mutex<Vec<MockCall>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            kind: ProviderKind::Mock,
            behavior,
            script: Arc::new(Mutex::new(VecDeque::new())),
            translator: Arc::new(|text| format!("[TRANSLATED] {}", text)),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns one translation too few
    pub fn wrong_count() -> Self {
        Self::new(MockBehavior::WrongCount)
    }

    /// Create a mock that panics on every call
    pub fn panicking() -> Self {
        Self::new(MockBehavior::Panicking)
    }

    /// Create a mock that takes `delay_ms` per call
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Report as another provider kind
    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Behaviors for the first calls, the default applies afterwards
    pub fn with_script(self, script: impl IntoIterator<Item = MockBehavior>) -> Self {
        self.script.lock().extend(script);
        self
    }

    /// Set a custom per-text translation
    pub fn with_translator(mut self, translator: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Highest number of calls that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn translate_all(&self, texts: &[String]) -> Vec<String> {
        texts.iter().map(|t| (self.translator)(t)).collect()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            behavior: self.behavior,
            script: Arc::clone(&self.script),
            translator: Arc::clone(&self.translator),
            calls: Arc::clone(&self.calls),
            in_flight: Arc::clone(&self.in_flight),
            peak_in_flight: Arc::clone(&self.peak_in_flight),
        }
    }
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("kind", &self.kind)
            .field("behavior", &self.behavior)
            .field("calls", &self.call_count())
            .finish()
    }
}

/// Decrements the in-flight counter even when the call panics
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn batch_translate(&self, texts: &[String]) -> Result<Vec<String>, ProviderError> {
        let call_number = {
            let mut calls = self.calls.lock();
            calls.push(MockCall {
                at: Instant::now(),
                texts: texts.to_vec(),
            });
            calls.len()
        };
        let behavior = self.script.lock().pop_front().unwrap_or(self.behavior);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match behavior {
            MockBehavior::Working => Ok(self.translate_all(texts)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: format!("Simulated provider failure (call #{})", call_number),
                status_code: 500,
            }),

            MockBehavior::WrongCount => {
                let mut translations = self.translate_all(texts);
                translations.pop();
                Ok(translations)
            }

            MockBehavior::Panicking => panic!("Simulated provider panic (call #{})", call_number),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.translate_all(texts))
            }
        }
    }
}
