use async_trait::async_trait;
use chrono::DateTime;
use hmac::{Hmac, Mac};
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::app_config::ProviderKind;
use crate::errors::ProviderError;
use crate::language_utils::to_tencent_code;
use super::{Provider, build_client, check_status, ensure_count};

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "tmt";
const ACTION: &str = "TextTranslateBatch";
const VERSION: &str = "2018-03-21";
const ALGORITHM: &str = "TC3-HMAC-SHA256";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Tencent Cloud machine translation (TMT) client
#[derive(Debug)]
pub struct Tencent {
    endpoint: String,
    secret_id: String,
    secret_key: String,
    region: String,
    source: String,
    target: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BatchRequest<'a> {
    source_text_list: &'a [String],
    source: &'a str,
    target: &'a str,
    project_id: i64,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: BatchResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BatchResponse {
    #[serde(default)]
    target_text_list: Option<Vec<String>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiErrorBody {
    code: String,
    message: String,
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ProviderError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ProviderError::AuthenticationError(format!("Invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Build the TC3-HMAC-SHA256 `Authorization` header value for `payload`
pub fn authorization(
    secret_id: &str,
    secret_key: &str,
    host: &str,
    payload: &str,
    timestamp: i64,
) -> Result<String, ProviderError> {
    let date = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| ProviderError::AuthenticationError(format!("Invalid timestamp {}", timestamp)))?
        .format("%Y-%m-%d")
        .to_string();

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\n\ncontent-type;host\n{}",
        CONTENT_TYPE,
        host,
        sha256_hex(payload.as_bytes())
    );
    let scope = format!("{}/{}/tc3_request", date, SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let secret_date = hmac_sha256(format!("TC3{}", secret_key).as_bytes(), date.as_bytes())?;
    let secret_service = hmac_sha256(&secret_date, SERVICE.as_bytes())?;
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
    let signature = hmac_sha256(&secret_signing, string_to_sign.as_bytes())?
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>();

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders=content-type;host, Signature={}",
        ALGORITHM, secret_id, scope, signature
    ))
}

impl Tencent {
    /// Create a new Tencent TMT client
    pub fn new(
        endpoint: impl Into<String>,
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
        source_language: &str,
        target_language: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: endpoint.into(),
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            source: to_tencent_code(source_language),
            target: to_tencent_code(target_language),
            client: build_client(timeout_secs)?,
        })
    }

    /// Host as it appears in the signed `host` header
    fn host(&self) -> Result<String, ProviderError> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", self.endpoint, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| ProviderError::RequestFailed(format!("Endpoint '{}' has no host", self.endpoint)))?;
        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

#[async_trait]
impl Provider for Tencent {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tencent
    }

    async fn batch_translate(&self, texts: &[String]) -> Result<Vec<String>, ProviderError> {
        let payload = serde_json::to_string(&BatchRequest {
            source_text_list: texts,
            source: &self.source,
            target: &self.target,
            project_id: 0,
        })
        .map_err(|e| ProviderError::RequestFailed(format!("Failed to encode request: {}", e)))?;

        let timestamp = chrono::Utc::now().timestamp();
        let auth = authorization(&self.secret_id, &self.secret_key, &self.host()?, &payload, timestamp)?;
        debug!("Tencent: translating {} texts", texts.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", auth)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-TC-Action", ACTION)
            .header("X-TC-Version", VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Region", &self.region)
            .body(payload)
            .send()
            .await?;
        let response = check_status(response).await?;

        let envelope = response
            .json::<Envelope>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Tencent response: {}", e)))?;

        if let Some(err) = envelope.response.error {
            error!("Tencent API error {}: {}", err.code, err.message);
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: format!("{}: {}", err.code, err.message),
            });
        }

        let translations = envelope
            .response
            .target_text_list
            .ok_or_else(|| ProviderError::ParseError("Tencent response without TargetTextList".to_string()))?;
        ensure_count(texts.len(), translations)
    }
}
