use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::transport::HttpRequest;
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Method;
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256, Sha384, Sha512};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Request parameters in sorted key order.
pub type Params = BTreeMap<String, Value>;

/// API credentials held by a signer.
#[derive(Clone)]
pub struct Credentials {
    api_key: Secret<String>,
    secret: Secret<String>,
    passphrase: Option<Secret<String>>,
    uid: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            secret: Secret::new(secret.into()),
            passphrase: None,
            uid: None,
        }
    }

    /// Credentials from a config, or `None` for a read-only config.
    pub fn from_config(config: &ExchangeConfig) -> Option<Self> {
        config.has_credentials().then(|| Self {
            api_key: config.api_key.clone(),
            secret: config.secret_key.clone(),
            passphrase: config.passphrase.clone(),
            uid: config.uid.clone(),
        })
    }

    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_ref().map(|p| p.expose_secret().as_str())
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("has_passphrase", &self.passphrase.is_some())
            .finish_non_exhaustive()
    }
}

/// A private call after path substitution, before authentication.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub exchange: String,
    pub method: Method,
    /// Base URL joined with the substituted path, without a query string.
    pub url: String,
    pub path: String,
    pub params: Params,
}

/// Per-exchange authentication scheme.
///
/// Implementations document the exact byte sequence they sign. Signing must
/// be a pure function of the request, the credentials and the nonce.
pub trait Signer: Send + Sync {
    fn has_credentials(&self) -> bool;

    fn sign(&self, request: PreparedRequest, nonce: u64) -> Result<HttpRequest, ExchangeError>;
}

/// Substitute `{placeholder}` tokens from `params`, removing the used keys.
///
/// Unknown placeholders are left in place.
pub fn implode_path(template: &str, params: &mut Params) -> String {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let key = &rest[start + 1..start + len];
        path.push_str(&rest[..start]);
        match params.remove(key) {
            Some(value) => path.push_str(&param_string(&value)),
            None => path.push_str(&rest[start..=start + len]),
        }
        rest = &rest[start + len + 1..];
    }
    path.push_str(rest);
    path
}

/// Text form of a parameter value as it appears in a query or form body.
pub fn param_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `k=v&...` in the given order, values percent-encoded.
pub fn urlencode<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&param_string(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Append an encoded query to `url` when there is one.
pub fn with_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else {
        format!("{}?{}", url, query)
    }
}

/// Digest used for MACs and payload hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

fn mac_error(e: hmac::digest::InvalidLength) -> ExchangeError {
    ExchangeError::authentication("signer", format!("Invalid secret key: {}", e))
}

pub fn hmac_bytes(
    algorithm: HashAlgorithm,
    secret: &[u8],
    payload: &[u8],
) -> Result<Vec<u8>, ExchangeError> {
    let bytes = match algorithm {
        HashAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(mac_error)?;
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(secret).map_err(mac_error)?;
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(secret).map_err(mac_error)?;
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(bytes)
}

pub fn hmac_hex(
    algorithm: HashAlgorithm,
    secret: &[u8],
    payload: &[u8],
) -> Result<String, ExchangeError> {
    hmac_bytes(algorithm, secret, payload).map(hex::encode)
}

pub fn hmac_base64(
    algorithm: HashAlgorithm,
    secret: &[u8],
    payload: &[u8],
) -> Result<String, ExchangeError> {
    hmac_bytes(algorithm, secret, payload).map(|bytes| general_purpose::STANDARD.encode(bytes))
}

pub fn hash_hex(algorithm: HashAlgorithm, payload: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(payload)),
        HashAlgorithm::Sha384 => hex::encode(Sha384::digest(payload)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(payload)),
    }
}

pub fn base64_encode(payload: &[u8]) -> String {
    general_purpose::STANDARD.encode(payload)
}

pub fn base64_decode(exchange: &str, encoded: &str) -> Result<Vec<u8>, ExchangeError> {
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ExchangeError::authentication(exchange, format!("secret is not valid base64: {}", e)))
}
