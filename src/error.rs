// src/error.rs

//! Unified error handling for the tracker.

use std::fmt;

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Remote query failures never show up here: the fetcher absorbs them and
/// degrades to a zero count. Everything in this enum is fatal for a run.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Writing results to a sink failed
    #[error("Export error for {target}: {message}")]
    Export { target: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an export error with the sink it concerns.
    pub fn export(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Export {
            target: target.into(),
            message: message.to_string(),
        }
    }
}
