use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::ProviderKind;
use crate::errors::ProviderError;
use super::{Provider, build_client, check_status, ensure_count};

/// Microsoft Translator (Azure Cognitive Services) client
#[derive(Debug)]
pub struct Microsoft {
    /// Base URL, `translate` is appended
    endpoint: String,
    /// Subscription key
    api_key: String,
    /// Subscription region
    region: String,
    /// Source language as Azure spells it
    from: String,
    /// Target language as Azure spells it
    to: String,
    /// HTTP client for making requests
    client: Client,
}

/// One element of the request array
#[derive(Debug, Serialize)]
struct TextItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

/// One element of the response array
#[derive(Debug, Deserialize)]
struct TranslationItem {
    translations: Vec<TranslationText>,
}

#[derive(Debug, Deserialize)]
struct TranslationText {
    text: String,
}

impl Microsoft {
    /// Create a new Microsoft Translator client
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        region: impl Into<String>,
        source_language: &str,
        target_language: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            region: region.into(),
            from: source_language.to_string(),
            to: target_language.to_string(),
            client: build_client(timeout_secs)?,
        })
    }

    fn translate_url(&self) -> Result<url::Url, ProviderError> {
        let base = if self.endpoint.ends_with('/') {
            self.endpoint.clone()
        } else {
            format!("{}/", self.endpoint)
        };
        let mut url = url::Url::parse(&base)
            .and_then(|base| base.join("translate"))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", self.endpoint, e)))?;
        url.query_pairs_mut()
            .append_pair("api-version", "3.0")
            .append_pair("from", &self.from)
            .append_pair("to", &self.to);
        Ok(url)
    }
}

#[async_trait]
impl Provider for Microsoft {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Microsoft
    }

    async fn batch_translate(&self, texts: &[String]) -> Result<Vec<String>, ProviderError> {
        let body: Vec<TextItem> = texts.iter().map(|t| TextItem { text: t }).collect();
        debug!("Microsoft: translating {} texts", texts.len());

        let response = self
            .client
            .post(self.translate_url()?)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Ocp-Apim-Subscription-Region", &self.region)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await.inspect_err(|e| {
            error!("Microsoft API error: {}", e);
        })?;

        let items = response
            .json::<Vec<TranslationItem>>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Microsoft response: {}", e)))?;

        let translations = items
            .into_iter()
            .map(|item| {
                item.translations
                    .into_iter()
                    .next()
                    .map(|t| t.text)
                    .ok_or_else(|| ProviderError::ParseError("Microsoft response item without translations".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        ensure_count(texts.len(), translations)
    }
}
