use async_trait::async_trait;
use log::{debug, error};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

use crate::app_config::ProviderKind;
use crate::errors::ProviderError;
use crate::language_utils::to_baidu_code;
use super::{Provider, build_client, check_status, ensure_count};

/// Baidu Fanyi general translation client
///
/// The batch is sent as one newline-joined query and comes back as one
/// result per line.
#[derive(Debug)]
pub struct Baidu {
    endpoint: String,
    app_id: String,
    secret_key: String,
    from: String,
    to: String,
    client: Client,
}

/// `error_code` Baidu sends alongside a successful result
const SUCCESS_CODE: &str = "52000";

#[derive(Debug, Deserialize)]
struct BaiduResponse {
    #[serde(default)]
    error_code: Option<serde_json::Value>,
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    trans_result: Vec<BaiduLine>,
}

#[derive(Debug, Deserialize)]
struct BaiduLine {
    dst: String,
}

/// `md5(appid + q + salt + key)` as lowercase hex
pub fn sign(app_id: &str, query: &str, salt: &str, secret_key: &str) -> String {
    let digest = md5::compute(format!("{}{}{}{}", app_id, query, salt, secret_key));
    format!("{:x}", digest)
}

impl Baidu {
    /// Create a new Baidu Fanyi client
    pub fn new(
        endpoint: impl Into<String>,
        app_id: impl Into<String>,
        secret_key: impl Into<String>,
        source_language: &str,
        target_language: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            secret_key: secret_key.into(),
            from: to_baidu_code(source_language),
            to: to_baidu_code(target_language),
            client: build_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl Provider for Baidu {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Baidu
    }

    async fn batch_translate(&self, texts: &[String]) -> Result<Vec<String>, ProviderError> {
        let query = texts.join("\n");
        let salt = rand::rng().random_range(100_000..1_000_000).to_string();
        let signature = sign(&self.app_id, &query, &salt, &self.secret_key);
        debug!("Baidu: translating {} texts", texts.len());

        let form = [
            ("q", query.as_str()),
            ("from", self.from.as_str()),
            ("to", self.to.as_str()),
            ("appid", self.app_id.as_str()),
            ("salt", salt.as_str()),
            ("sign", signature.as_str()),
        ];

        let response = self.client.post(&self.endpoint).form(&form).send().await?;
        let response = check_status(response).await?;

        let body = response
            .json::<BaiduResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Baidu response: {}", e)))?;

        if let Some(code) = body.error_code {
            let code = match &code {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if code != SUCCESS_CODE {
                let message = body.error_msg.unwrap_or_default();
                error!("Baidu API error {}: {}", code, message);
                return Err(ProviderError::ApiError {
                    status_code: code.parse().unwrap_or(0),
                    message: format!("{} ({})", message, code),
                });
            }
        }

        let translations = body.trans_result.into_iter().map(|line| line.dst).collect();
        ensure_count(texts.len(), translations)
    }
}
