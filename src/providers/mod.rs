/*!
 * Provider implementations for different machine translation services.
 *
 * This module contains client implementations for the supported services:
 * - Microsoft: Azure Translator, JSON array body
 * - Baidu: Baidu Fanyi, signed form body
 * - Tencent: Tencent Cloud TMT, TC3-HMAC-SHA256 signed JSON body
 * - Mock: in-process scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{ProviderConfig, ProviderKind};
use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be scheduled interchangeably by the orchestrator.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Which service this is
    fn kind(&self) -> ProviderKind;

    /// Translate a batch of texts
    ///
    /// # Arguments
    /// * `texts` - Tag-protected source texts
    ///
    /// # Returns
    /// * `Result<Vec<String>, ProviderError>` - One translation per input, in input order
    async fn batch_translate(&self, texts: &[String]) -> Result<Vec<String>, ProviderError>;
}

/// Reject a response whose length differs from the request
pub fn ensure_count(expected: usize, translations: Vec<String>) -> Result<Vec<String>, ProviderError> {
    if translations.len() != expected {
        return Err(ProviderError::CountMismatch {
            expected,
            actual: translations.len(),
        });
    }
    Ok(translations)
}

/// HTTP client with the per-call timeout applied
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProviderError::ConnectionError(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into an `ApiError`
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(ProviderError::AuthenticationError(message));
    }
    Err(ProviderError::ApiError {
        status_code: status.as_u16(),
        message,
    })
}

/// Instantiate the adapter described by `config`
pub fn build_provider(
    config: &ProviderConfig,
    source_language: &str,
    target_language: &str,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider: Arc<dyn Provider> = match config.provider_type {
        ProviderKind::Microsoft => Arc::new(microsoft::Microsoft::new(
            config.effective_endpoint(),
            config.api_key.clone(),
            config.effective_region(),
            source_language,
            target_language,
            config.timeout_secs,
        )?),
        ProviderKind::Baidu => Arc::new(baidu::Baidu::new(
            config.effective_endpoint(),
            config.app_id.clone(),
            config.api_key.clone(),
            source_language,
            target_language,
            config.timeout_secs,
        )?),
        ProviderKind::Tencent => Arc::new(tencent::Tencent::new(
            config.effective_endpoint(),
            config.app_id.clone(),
            config.api_key.clone(),
            config.effective_region(),
            source_language,
            target_language,
            config.timeout_secs,
        )?),
        ProviderKind::Mock => {
            return Err(ProviderError::NotConfigurable(
                config.provider_type.display_name().to_string(),
            ))
        }
    };
    Ok(provider)
}

pub mod microsoft;
pub mod baidu;
pub mod tencent;
pub mod mock;
