//! Custom error types for translation operations

use thiserror::Error;

use crate::core::language::{Language, SourceLanguage};
use crate::core::messages::{DisplayLanguage, Message};

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// No chain of registered translators connects source and target
    #[error("No translation route from {from} to {to}")]
    NoPath {
        from: SourceLanguage,
        to: Language,
    },

    /// Source and target resolve to the same language
    #[error("Cannot translate {language} to itself")]
    SameLanguage {
        language: Language,
    },

    /// Input text is longer than the configured maximum
    #[error("Text too long: {length} characters (max {max})")]
    TextTooLong {
        length: usize,
        max: usize,
    },

    /// Two translators declared the same edge
    #[error("Translators '{existing}' and '{incoming}' both declare {from} -> {to}")]
    EdgeConflict {
        from: SourceLanguage,
        to: Language,
        existing: String,
        incoming: String,
    },

    /// Language code not known to the router or a provider
    #[error("Unsupported language: {code}")]
    UnsupportedLanguage {
        code: String,
    },

    /// API request failed
    #[error("API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Upstream rate limit exceeded
    #[error("Rate limit exceeded. Retry after {retry_after:?} seconds")]
    RateLimitError {
        retry_after: Option<u64>,
    },

    /// Upstream character quota exceeded
    #[error("Translation quota exceeded")]
    QuotaExceededError,

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Request timeout
    #[error("Request timeout")]
    TimeoutError,

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        path: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Wrapper for anyhow errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl TranslationError {
    /// Whether the error came from a provider call rather than the router
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            TranslationError::ApiError { .. }
                | TranslationError::RateLimitError { .. }
                | TranslationError::QuotaExceededError
                | TranslationError::NetworkError { .. }
                | TranslationError::InvalidResponseError { .. }
                | TranslationError::TimeoutError
                | TranslationError::HttpError(_)
        )
    }

    /// Map a reqwest failure onto the closest variant
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslationError::TimeoutError
        } else if err.is_connect() || err.is_request() {
            TranslationError::NetworkError {
                message: err.to_string(),
            }
        } else {
            TranslationError::HttpError(err)
        }
    }

    /// Localized text suitable for showing to the person who asked
    pub fn user_message(&self, display: DisplayLanguage) -> String {
        let message = match self {
            TranslationError::SameLanguage { .. } => Message::SameLanguage,
            TranslationError::TextTooLong { .. } => Message::TranslationTooLong,
            TranslationError::NoPath { .. } => Message::NoRoute,
            TranslationError::UnsupportedLanguage { code } => {
                Message::UnsupportedLanguage(code.clone())
            }
            _ => Message::TranslationError,
        };
        message.render(display)
    }
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::InternalError(err.to_string())
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
