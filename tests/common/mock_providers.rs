/*!
 * Mock provider implementations for testing
 *
 * `MockProvider` from the library covers scripted behaviors. The provider
 * here fails only for selected texts, which is needed to show that one
 * batch's failure leaves its siblings alone.
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use gameloc::app_config::ProviderKind;
use gameloc::errors::ProviderError;
use gameloc::providers::Provider;

/// Fails every batch containing a text with `marker`, translates the rest
#[derive(Debug)]
pub struct SelectiveProvider {
    marker: String,
    /// Count of calls made
    pub call_count: AtomicUsize,
}

impl SelectiveProvider {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for SelectiveProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    async fn batch_translate(&self, texts: &[String]) -> Result<Vec<String>, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if texts.iter().any(|t| t.contains(&self.marker)) {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: format!("Simulated failure for '{}'", self.marker),
            });
        }
        Ok(texts.iter().map(|t| format!("<{}>", t)).collect())
    }
}
