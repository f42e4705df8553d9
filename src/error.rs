// src/error.rs

//! Unified error handling for the harvester application.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed at the transport layer
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request completed with a non-success status
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Post timestamp did not match the expected source format
    #[error("Malformed timestamp '{value}': {message}")]
    Timestamp { value: String, message: String },

    /// Rendering surface failure (launch, evaluation, transport)
    #[error("Browser error: {0}")]
    Browser(String),

    /// Navigation to a target failed or timed out
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// Session credential input missing or unusable
    #[error("Session error: {0}")]
    Session(String),

    /// Workbook serialization failed
    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a timestamp parsing error.
    pub fn timestamp(value: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Timestamp {
            value: value.into(),
            message: message.to_string(),
        }
    }

    /// Create a rendering surface error.
    pub fn browser(message: impl fmt::Display) -> Self {
        Self::Browser(message.to_string())
    }

    /// Create a navigation error.
    pub fn navigation(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a session credential error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_message_names_url() {
        let err = AppError::navigation("https://x.com/someone", "timed out after 60s");
        assert_eq!(
            err.to_string(),
            "Navigation to https://x.com/someone failed: timed out after 60s"
        );
    }

    #[test]
    fn test_timestamp_error_keeps_value() {
        let source = chrono::NaiveDateTime::parse_from_str("nope", "%Y").unwrap_err();
        let err = AppError::timestamp("nope", source);
        assert!(err.to_string().starts_with("Malformed timestamp 'nope'"));
    }
}
