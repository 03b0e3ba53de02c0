use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    hmac_hex, urlencode, with_query, Credentials, HashAlgorithm, HttpRequest, PreparedRequest,
    Signer,
};
use reqwest::Method;

/// HBTC private request signing
///
/// The signed string is the url-encoded query `timestamp={nonce}` followed
/// by the request parameters in key order. Its hex HMAC-SHA256 under the
/// secret is appended as `signature`; the whole query is the form body of a
/// POST and the query string of every other method. The key travels in
/// `X-BH-APIKEY`.
#[derive(Debug, Clone)]
pub struct HbtcSigner {
    credentials: Option<Credentials>,
}

impl HbtcSigner {
    pub const fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }

    fn auth_query(request: &PreparedRequest, timestamp: u64) -> String {
        let mut auth = format!("timestamp={}", timestamp);
        if !request.params.is_empty() {
            auth.push('&');
            auth.push_str(&urlencode(&request.params));
        }
        auth
    }
}

impl Signer for HbtcSigner {
    fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn sign(&self, request: PreparedRequest, nonce: u64) -> Result<HttpRequest, ExchangeError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::authentication(&request.exchange, "apiKey and secret are required")
        })?;

        let auth = Self::auth_query(&request, nonce);
        let signature = hmac_hex(
            HashAlgorithm::Sha256,
            credentials.secret().as_bytes(),
            auth.as_bytes(),
        )?;
        let query = format!("{}&signature={}", auth, signature);

        let mut headers = vec![("X-BH-APIKEY".to_string(), credentials.api_key().to_string())];
        if request.method == Method::POST {
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
            Ok(HttpRequest {
                method: request.method,
                url: request.url,
                headers,
                body: Some(query),
            })
        } else {
            Ok(HttpRequest {
                method: request.method,
                url: with_query(&request.url, &query),
                headers,
                body: None,
            })
        }
    }
}
