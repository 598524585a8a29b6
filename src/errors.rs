/*!
 * Error types for the doctran application.
 *
 * This module contains custom error types for different parts of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to a translation provider API
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
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while translating a single page
#[derive(Error, Debug)]
pub enum TranslateError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider returned an empty translation for a non-empty page
    #[error("Provider returned an empty translation for page {index}")]
    EmptyTranslation {
        /// Index of the page that produced the empty translation
        index: u32,
    },
}

/// Errors that can occur when loading or persisting the page cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// Error reading or writing the cache record file
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        /// Path of the cache record
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The in-memory mapping could not be encoded for persistence
    #[error("Failed to encode cache record for {path}: {source}")]
    Encode {
        /// Path of the cache record
        path: PathBuf,
        /// Underlying encode error
        #[source]
        source: serde_json::Error,
    },

    /// The cache record exists but cannot be parsed.
    /// Corruption is surfaced loudly rather than treated as an empty cache,
    /// otherwise previously completed work would silently disappear.
    #[error("Cache record at {path} is corrupt: {source}")]
    Corrupt {
        /// Path of the cache record
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from page translation
    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    /// Error from the page cache
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
