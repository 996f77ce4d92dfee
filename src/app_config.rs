use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO, optionally with a script subtag like `zh-Hans`)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Which document fields get extracted for translation
    #[serde(default)]
    pub scan: ScanConfig,

    /// Location of the persisted translation cache
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Machine translation services the engine can dispatch to
///
/// Declaration order is the scheduler's tie-break priority.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    // @provider: Microsoft Translator (Azure Cognitive Services)
    Microsoft,
    // @provider: Baidu Fanyi
    Baidu,
    // @provider: Tencent Cloud TMT
    Tencent,
    // @provider: In-process mock, used by tests; never read from a config file
    #[serde(skip)]
    Mock,
}

impl ProviderKind {
    /// Providers that can be configured from a config file, in priority order
    pub const CONFIGURABLE: [ProviderKind; 3] = [Self::Microsoft, Self::Baidu, Self::Tencent];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Microsoft => "Microsoft",
            Self::Baidu => "Baidu",
            Self::Tencent => "Tencent",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Microsoft => "microsoft".to_string(),
            Self::Baidu => "baidu".to_string(),
            Self::Tencent => "tencent".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }

    /// Concurrent request budget observed for each service
    pub fn default_max_concurrent_requests(&self) -> usize {
        match self {
            Self::Microsoft => 10,
            Self::Baidu => 10,
            Self::Tencent => 5,
            Self::Mock => 4,
        }
    }

    /// Whether the service needs an application id in addition to the key
    pub fn requires_app_id(&self) -> bool {
        matches!(self, Self::Baidu | Self::Tencent)
    }
}

// Implement Display trait for ProviderKind
impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for ProviderKind
impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "microsoft" | "azure" => Ok(Self::Microsoft),
            "baidu" => Ok(Self::Baidu),
            "tencent" | "tengxun" => Ok(Self::Tencent),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Per-provider settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: ProviderKind,

    // @field: Whether batches may be scheduled on this provider
    #[serde(default)]
    pub enabled: bool,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Application id (Baidu appid, Tencent SecretId)
    #[serde(default = "String::new")]
    pub app_id: String,

    // @field: API key (Microsoft subscription key, Baidu key, Tencent SecretKey)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service region
    #[serde(default = "String::new")]
    pub region: String,

    // @field: Max concurrent requests, 0 means the provider default
    #[serde(default)]
    pub max_concurrent_requests: usize,

    // @field: Timeout seconds for a single call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults, disabled
    pub fn new(provider_type: ProviderKind) -> Self {
        Self {
            provider_type,
            enabled: false,
            endpoint: default_endpoint(provider_type),
            app_id: String::new(),
            api_key: String::new(),
            region: default_region(provider_type),
            max_concurrent_requests: provider_type.default_max_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Endpoint, falling back to the provider's public API
    pub fn effective_endpoint(&self) -> String {
        if self.endpoint.is_empty() {
            default_endpoint(self.provider_type)
        } else {
            self.endpoint.clone()
        }
    }

    /// Region, falling back to the provider default
    pub fn effective_region(&self) -> String {
        if self.region.is_empty() {
            default_region(self.provider_type)
        } else {
            self.region.clone()
        }
    }

    /// Permit count for the scheduler
    pub fn effective_max_concurrent_requests(&self) -> usize {
        if self.max_concurrent_requests == 0 {
            self.provider_type.default_max_concurrent_requests()
        } else {
            self.max_concurrent_requests
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Configured translation providers, in scheduling priority order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Number of unique texts sent per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Document field selection
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanConfig {
    /// Locator patterns, `*` matches every index of a list
    #[serde(default = "default_scan_fields")]
    pub fields: Vec<String>,

    /// Values that are never sent for translation
    #[serde(default = "default_skip_values")]
    pub skip_values: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fields: default_scan_fields(),
            skip_values: default_skip_values(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "zh-Hans".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_batch_size() -> usize {
    25
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_endpoint(provider: ProviderKind) -> String {
    match provider {
        ProviderKind::Microsoft => "https://api.cognitive.microsofttranslator.com/".to_string(),
        ProviderKind::Baidu => "https://fanyi-api.baidu.com/api/trans/vip/translate".to_string(),
        ProviderKind::Tencent => "https://tmt.tencentcloudapi.com/".to_string(),
        ProviderKind::Mock => String::new(),
    }
}

fn default_region(provider: ProviderKind) -> String {
    match provider {
        ProviderKind::Microsoft => "eastasia".to_string(),
        ProviderKind::Tencent => "ap-guangzhou".to_string(),
        ProviderKind::Baidu | ProviderKind::Mock => String::new(),
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    ProviderKind::CONFIGURABLE
        .iter()
        .map(|kind| ProviderConfig::new(*kind))
        .collect()
}

fn default_scan_fields() -> Vec<String> {
    [
        "dataList[*].content",
        "dataList[*].name",
        "dataList[*].desc",
        "dataList[*].summary",
        "dataList[*].flavor",
        "dataList[*].title",
        "dataList[*].levelList[*].name",
        "dataList[*].levelList[*].desc",
        "dataList[*].levelList[*].coinlist[*].coindescs[*].desc",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_skip_values() -> Vec<String> {
    vec!["-".to_string()]
}

/// Default cache location under the user data directory
pub fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gameloc")
        .join("translation_cache.json")
}

impl Config {
    /// Load a configuration file, creating one with defaults when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if self.translation.common.batch_size == 0 {
            return Err(anyhow!("Batch size must be greater than zero"));
        }

        for provider in self.translation.enabled_providers() {
            if !ProviderKind::CONFIGURABLE.contains(&provider.provider_type) {
                return Err(anyhow!(
                    "{} provider cannot be enabled from configuration",
                    provider.provider_type.display_name()
                ));
            }
            if provider.timeout_secs == 0 {
                return Err(anyhow!(
                    "Timeout for {} provider must be greater than zero",
                    provider.provider_type.display_name()
                ));
            }
            if provider.api_key.is_empty() {
                return Err(anyhow!(
                    "Translation API key is required for {} provider",
                    provider.provider_type.display_name()
                ));
            }
            if provider.provider_type.requires_app_id() && provider.app_id.is_empty() {
                return Err(anyhow!(
                    "Application id is required for {} provider",
                    provider.provider_type.display_name()
                ));
            }
        }

        Ok(())
    }

    /// Cache file to load at startup and flush after a run
    pub fn effective_cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            scan: ScanConfig::default(),
            cache_path: None,
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.provider_type == provider_type)
    }

    /// Mutable access, used for CLI overrides
    pub fn get_provider_config_mut(&mut self, provider_type: ProviderKind) -> Option<&mut ProviderConfig> {
        self.providers.iter_mut().find(|p| p.provider_type == provider_type)
    }

    /// Providers switched on in the configuration, in priority order
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            common: TranslationCommonConfig::default(),
        }
    }
}
