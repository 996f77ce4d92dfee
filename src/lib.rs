/*!
 * # gameloc - batch machine translation for game data
 *
 * A Rust library for localizing the text stored in game JSON documents
 * through commercial machine translation services.
 *
 * ## Features
 *
 * - Extract translatable fields from JSON documents with locator patterns
 * - Protect inline markup (`[Keyword]`, `<color=red>`) across translation
 * - Translate identical texts once and remember them in a persistent cache
 * - Spread batches across several providers:
 *   - Microsoft Translator
 *   - Baidu Fanyi
 *   - Tencent Cloud TMT
 * - Bounded per-provider concurrency with retries and exponential backoff
 * - Atomic write-back of edited documents
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `documents`: Locators, content scanning and the document store
 * - `translation`: The batch translation engine:
 *   - `translation::tags`: Markup protection
 *   - `translation::cache`: Translation cache
 *   - `translation::scheduler`: Provider scheduling
 *   - `translation::orchestrator`: Batching and retries
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for the translation services
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod documents;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, ProviderKind};
pub use documents::{ContentScanner, DocumentStore, Locator, ResultSink};
pub use translation::{BatchOrchestrator, RunSummary, TranslationCache, TranslationTask};
pub use language_utils::{language_codes_match, normalize_to_part3, get_language_name};
pub use errors::{DocumentError, ProviderError, TranslationError};
