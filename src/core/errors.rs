use std::fmt;
use thiserror::Error;

/// Semantic failure categories shared by every connector.
///
/// Connectors never expose vendor-specific error types; the classifier maps
/// vendor codes and messages onto one of these and callers match on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    PermissionDenied,
    InsufficientFunds,
    InvalidOrder,
    OrderNotFound,
    InvalidNonce,
    /// Throttled by the vendor, including DDoS-protection responses.
    RateLimited,
    ExchangeNotAvailable,
    ArgumentsRequired,
    BadRequest,
    BadSymbol,
    InvalidAddress,
    NotSupported,
    /// Catch-all for vendor-flagged failures with no specific mapping.
    Exchange,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "AuthenticationError",
            Self::PermissionDenied => "PermissionDenied",
            Self::InsufficientFunds => "InsufficientFunds",
            Self::InvalidOrder => "InvalidOrder",
            Self::OrderNotFound => "OrderNotFound",
            Self::InvalidNonce => "InvalidNonce",
            Self::RateLimited => "RateLimited",
            Self::ExchangeNotAvailable => "ExchangeNotAvailable",
            Self::ArgumentsRequired => "ArgumentsRequired",
            Self::BadRequest => "BadRequest",
            Self::BadSymbol => "BadSymbol",
            Self::InvalidAddress => "InvalidAddress",
            Self::NotSupported => "NotSupported",
            Self::Exchange => "ExchangeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("{kind} [{exchange}]: {feedback}")]
    Exchange {
        kind: ErrorKind,
        exchange: String,
        feedback: String,
    },

    /// Connectivity or timeout failure reported by the transport.
    #[error("Network error [{exchange}]: {message}")]
    Network { exchange: String, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The payload was not the container type the parser expects.
    #[error("Invalid response [{exchange}]: {message}")]
    InvalidResponse { exchange: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    pub fn new(kind: ErrorKind, exchange: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self::Exchange {
            kind,
            exchange: exchange.into(),
            feedback: feedback.into(),
        }
    }

    pub fn authentication(exchange: &str, feedback: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, exchange, feedback)
    }

    pub fn arguments_required(exchange: &str, feedback: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArgumentsRequired, exchange, feedback)
    }

    pub fn not_supported(exchange: &str, operation: &str) -> Self {
        Self::new(
            ErrorKind::NotSupported,
            exchange,
            format!("{} is not supported", operation),
        )
    }

    pub fn invalid_response(exchange: &str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            exchange: exchange.to_string(),
            message: message.into(),
        }
    }

    /// Semantic kind of a classified failure; `None` for transport and decoding errors.
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Exchange { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpError(_))
    }

    /// Raw vendor feedback carried by a classified failure.
    pub fn feedback(&self) -> Option<&str> {
        match self {
            Self::Exchange { feedback, .. } => Some(feedback),
            _ => None,
        }
    }

    pub fn exchange(&self) -> Option<&str> {
        match self {
            Self::Exchange { exchange, .. }
            | Self::Network { exchange, .. }
            | Self::InvalidResponse { exchange, .. } => Some(exchange),
            _ => None,
        }
    }
}
