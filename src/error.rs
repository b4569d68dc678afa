use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised by an exchange adapter while running one operation.
///
/// Every variant names the exchange so that a caller juggling several
/// adapters can tell where a failure came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("{exchange}: API key or secret key is missing")]
    MissingCredentials { exchange: &'static str },

    #[error("{exchange} {operation}: malformed response: {reason}")]
    Malformed {
        exchange: &'static str,
        operation: &'static str,
        reason: String,
    },

    #[error("{exchange} {operation}: rejected by exchange: {message}")]
    Rejected {
        exchange: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("{exchange}: no order matching id {order_id}")]
    OrderNotFound {
        exchange: &'static str,
        order_id: String,
    },

    #[error("{exchange}: invalid number in {field}: {value:?}")]
    InvalidNumber {
        exchange: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{exchange}: no listed symbol for pair {pair}")]
    UnknownSymbol { exchange: &'static str, pair: String },

    #[error("{exchange}: {operation} is not supported")]
    Unsupported {
        exchange: &'static str,
        operation: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The exchange-level cause, if this error came from an adapter.
    #[must_use]
    pub fn as_exchange(&self) -> Option<&ExchangeError> {
        match self {
            Error::Exchange(e) => Some(e),
            _ => None,
        }
    }
}
