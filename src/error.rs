//! Unified error handling for the swing trading bot
//!
//! One error type for the whole crate so callers can distinguish failures
//! that must abort the session from failures the trading loop retries on
//! its next tick.

use rust_decimal::Decimal;
use std::io;

/// Main error type for the swing trading bot
#[derive(Debug, thiserror::Error)]
pub enum TradingError {
    // Configuration errors
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    // Session preconditions
    #[error("No account found for currency {0}")]
    AccountNotFound(String),

    #[error("Insufficient starting balance: required {required}, available {available}")]
    InsufficientStartingBalance {
        required: Decimal,
        available: Decimal,
    },

    // API errors
    #[error("API connection error: {0}")]
    ApiConnection(String),

    #[error("API authentication failed: {0}")]
    ApiAuthentication(String),

    #[error("API response error: {0}")]
    ApiResponse(String),

    #[error("API timeout: {0}")]
    ApiTimeout(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    // IO errors
    #[error("File read error: {0}")]
    FileRead(String),

    #[error("File write error: {0}")]
    FileWrite(String),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TradingError {
    /// Errors that abort the session instead of being retried on the next
    /// tick. Everything transport-shaped is retryable once the loop is
    /// running; misconfiguration never is.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TradingError::ConfigNotFound(_)
                | TradingError::ConfigParse(_)
                | TradingError::ConfigValidation(_)
                | TradingError::AccountNotFound(_)
                | TradingError::InsufficientStartingBalance { .. }
        )
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            TradingError::ConfigNotFound(_)
            | TradingError::ConfigParse(_)
            | TradingError::ConfigValidation(_) => "config",

            TradingError::AccountNotFound(_)
            | TradingError::InsufficientStartingBalance { .. } => "session",

            TradingError::ApiConnection(_)
            | TradingError::ApiAuthentication(_)
            | TradingError::ApiResponse(_)
            | TradingError::ApiTimeout(_) => "api",

            TradingError::WebSocket(_) => "websocket",

            TradingError::FileRead(_) | TradingError::FileWrite(_) => "io",

            TradingError::Internal(_) => "internal",
        }
    }
}

// Conversion implementations for common error types

impl From<io::Error> for TradingError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => TradingError::FileRead(err.to_string()),
            io::ErrorKind::TimedOut => TradingError::ApiTimeout(err.to_string()),
            io::ErrorKind::ConnectionRefused => TradingError::ApiConnection(err.to_string()),
            _ => TradingError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl From<reqwest::Error> for TradingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TradingError::ApiTimeout(err.to_string())
        } else if err.is_connect() {
            TradingError::ApiConnection(err.to_string())
        } else if err.is_status() {
            TradingError::ApiResponse(err.to_string())
        } else {
            TradingError::ApiConnection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TradingError {
    fn from(err: serde_json::Error) -> Self {
        TradingError::ApiResponse(format!("JSON parse error: {}", err))
    }
}

impl From<toml::de::Error> for TradingError {
    fn from(err: toml::de::Error) -> Self {
        TradingError::ConfigParse(format!("TOML parse error: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TradingError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TradingError::WebSocket(err.to_string())
    }
}

/// Result type alias using TradingError
pub type TradingResult<T> = Result<T, TradingError>;
