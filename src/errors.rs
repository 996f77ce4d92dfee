/*!
 * Error types for the gameloc application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code (or the provider's own error code)
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the per-call timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider returned a different number of strings than it was sent
    #[error("Expected {expected} translations, provider returned {actual}")]
    CountMismatch {
        /// Number of texts sent
        expected: usize,
        /// Number of texts received
        actual: usize,
    },

    /// The provider kind has no configurable adapter
    #[error("{0} provider cannot be built from configuration")]
    NotConfigurable(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while reading, editing or writing game documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document could not be read or written
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Document path
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// The document is not valid JSON
    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson {
        /// Document path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The locator does not point at a string value inside the document
    #[error("No string value at {locator} in {path}")]
    LocatorNotFound {
        /// Document path
        path: PathBuf,
        /// Rendered locator
        locator: String,
    },

    /// A locator string could not be parsed
    #[error("Invalid locator '{0}'")]
    InvalidLocator(String),
}

/// Errors that can occur during translation orchestration
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error applying a result to a document
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// No provider is enabled, nothing can be translated
    #[error("No translation provider is enabled")]
    NoProviderEnabled,

    /// The persisted translation cache could not be loaded or saved
    #[error("Cache error: {0}")]
    Cache(String),

    /// The terminal flush did not run to completion
    #[error("Flush error: {0}")]
    Flush(String),
}
