use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{base64_decode, base64_encode};
use crate::core::kernel::{
    hmac_base64, Credentials, HashAlgorithm, HttpRequest, PreparedRequest, Signer,
};
use serde_json::Value;

/// TradeSatoshi private request signing
///
/// Every private call is a POST whose body is the JSON object of the
/// parameters. The signed string is
///
/// ```text
/// apiKey + METHOD + lowercase(percent_encode(url)) + nonce + base64(body)
/// ```
///
/// MACed with HMAC-SHA512 keyed by the base64-decoded secret. The base64
/// MAC travels in `Authorization: Basic {apiKey}:{signature}:{nonce}`.
#[derive(Debug, Clone)]
pub struct TradeSatoshiSigner {
    credentials: Option<Credentials>,
}

impl TradeSatoshiSigner {
    pub const fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }

    fn prehash(api_key: &str, method: &str, url: &str, nonce: u64, body: &str) -> String {
        format!(
            "{}{}{}{}{}",
            api_key,
            method,
            urlencoding::encode(url).to_lowercase(),
            nonce,
            base64_encode(body.as_bytes())
        )
    }
}

impl Signer for TradeSatoshiSigner {
    fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn sign(&self, request: PreparedRequest, nonce: u64) -> Result<HttpRequest, ExchangeError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::authentication(&request.exchange, "apiKey and secret are required")
        })?;

        let body = Value::Object(request.params.into_iter().collect()).to_string();
        let prehash = Self::prehash(
            credentials.api_key(),
            request.method.as_str(),
            &request.url,
            nonce,
            &body,
        );
        let secret = base64_decode(&request.exchange, credentials.secret())?;
        let signature = hmac_base64(HashAlgorithm::Sha512, &secret, prehash.as_bytes())?;

        Ok(HttpRequest {
            method: request.method,
            url: request.url,
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Basic {}:{}:{}", credentials.api_key(), signature, nonce),
                ),
                (
                    "Content-Type".to_string(),
                    "application/json; charset=utf-8".to_string(),
                ),
            ],
            body: Some(body),
        })
    }
}
