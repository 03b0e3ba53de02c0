use crate::core::errors::{ErrorKind, ExchangeError};
use serde_json::Value;
use std::collections::HashMap;

/// Vendor error strings mapped to semantic kinds.
///
/// Lookup runs in two tiers: exact match over every candidate first, then
/// substring match in table order.
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    exact: HashMap<String, ErrorKind>,
    broad: Vec<(String, ErrorKind)>,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact(mut self, key: impl Into<String>, kind: ErrorKind) -> Self {
        self.exact.insert(key.into(), kind);
        self
    }

    pub fn exact_all(mut self, keys: &[&str], kind: ErrorKind) -> Self {
        for key in keys {
            self.exact.insert((*key).to_string(), kind);
        }
        self
    }

    pub fn broad(mut self, key: impl Into<String>, kind: ErrorKind) -> Self {
        self.broad.push((key.into(), kind));
        self
    }

    pub fn match_exact(&self, candidate: &str) -> Option<ErrorKind> {
        self.exact.get(candidate).copied()
    }

    pub fn match_broad(&self, candidate: &str) -> Option<ErrorKind> {
        self.broad
            .iter()
            .find(|(key, _)| candidate.contains(key.as_str()))
            .map(|(_, kind)| *kind)
    }

    /// Classify using the vendor's error strings, most specific first.
    pub fn classify(&self, candidates: &[&str]) -> Option<ErrorKind> {
        candidates
            .iter()
            .find_map(|c| self.match_exact(c))
            .or_else(|| candidates.iter().find_map(|c| self.match_broad(c)))
    }
}

/// Raw response handed to a classifier.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub exchange: &'a str,
    pub status: u16,
    pub body: &'a str,
    /// Parsed body, when it is JSON.
    pub json: Option<&'a Value>,
}

impl ResponseContext<'_> {
    /// Diagnostic string carried by every classified error.
    pub fn feedback(&self) -> String {
        format!("{} {}", self.exchange, self.body)
    }

    pub fn error(&self, kind: ErrorKind) -> ExchangeError {
        ExchangeError::new(kind, self.exchange, self.feedback())
    }
}

/// Vendor-specific envelope inspection.
///
/// Returns `Ok(())` when the vendor does not flag the response as failed.
/// Unexpected shapes are not errors here.
pub trait ErrorClassifier: Send + Sync {
    fn check(&self, response: &ResponseContext<'_>) -> Result<(), ExchangeError>;
}

const UNAVAILABLE_HINTS: &[&str] = &[
    "offline",
    "busy",
    "retry",
    "wait",
    "unavailable",
    "maintain",
    "maintenance",
    "maintenancing",
];

const DDOS_HINTS: &[&str] = &["cloudflare", "incapsula", "overload", "ddos"];

/// Fallback for non-2xx responses no vendor rule claimed.
pub fn default_http_error(response: &ResponseContext<'_>) -> Result<(), ExchangeError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    let lowered = response.body.to_lowercase();
    let kind = match response.status {
        400 => ErrorKind::BadRequest,
        401 => ErrorKind::Authentication,
        403 if DDOS_HINTS.iter().any(|h| lowered.contains(h)) => ErrorKind::RateLimited,
        403 => ErrorKind::PermissionDenied,
        418 | 429 => ErrorKind::RateLimited,
        404 | 409 | 422 => ErrorKind::Exchange,
        500..=599 => ErrorKind::ExchangeNotAvailable,
        _ if DDOS_HINTS.iter().any(|h| lowered.contains(h)) => ErrorKind::RateLimited,
        _ if UNAVAILABLE_HINTS.iter().any(|h| lowered.contains(h)) => {
            ErrorKind::ExchangeNotAvailable
        }
        _ => ErrorKind::Exchange,
    };
    Err(ExchangeError::new(
        kind,
        response.exchange,
        format!("{} {} {}", response.exchange, response.status, response.body),
    ))
}
