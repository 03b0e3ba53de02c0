use crate::core::config::{ConfigError, ExchangeConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::classify::{default_http_error, ErrorClassifier, ResponseContext};
use crate::core::kernel::nonce::{MonotonicNonce, NonceSource};
use crate::core::kernel::signer::{
    implode_path, urlencode, with_query, Params, PreparedRequest, Signer,
};
use crate::core::kernel::transport::{
    HttpClient, HttpRequest, HttpResponse, ReqwestTransport, TransportConfig,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Private,
}

/// One row of a connector's endpoint table.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Key into the configured base URLs.
    pub api: &'static str,
    pub access: Access,
    pub method: Method,
    /// Path relative to the base URL; may contain `{placeholder}` tokens.
    pub path: &'static str,
}

impl Endpoint {
    pub const fn public(api: &'static str, method: Method, path: &'static str) -> Self {
        Self {
            api,
            access: Access::Public,
            method,
            path,
        }
    }

    pub const fn private(api: &'static str, method: Method, path: &'static str) -> Self {
        Self {
            api,
            access: Access::Private,
            method,
            path,
        }
    }
}

/// Build [`Params`] from literal pairs.
pub fn params<const N: usize>(pairs: [(&str, Value); N]) -> Params {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Configuration for the REST pipeline
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Exchange id for logging, tracing and error context
    pub exchange_name: String,
    pub base_urls: HashMap<&'static str, String>,
    pub timeout_seconds: u64,
    /// Minimum spacing between requests, `None` disables pacing.
    pub rate_limit: Option<Duration>,
}

impl RestClientConfig {
    pub fn new(exchange_name: impl Into<String>) -> Self {
        Self {
            exchange_name: exchange_name.into(),
            base_urls: HashMap::new(),
            timeout_seconds: 10,
            rate_limit: None,
        }
    }

    pub fn with_base_url(mut self, api: &'static str, url: impl Into<String>) -> Self {
        self.base_urls.insert(api, url.into());
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<Duration>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Apply the user-facing overrides from an [`ExchangeConfig`].
    pub fn with_exchange_config(mut self, config: &ExchangeConfig) -> Self {
        self.timeout_seconds = config.timeout_seconds;
        if let Some(ms) = config.rate_limit_ms {
            self.rate_limit = (ms > 0).then(|| Duration::from_millis(ms));
        }
        self
    }
}

/// Signer for connectors without credentials.
struct NoSigner;

impl Signer for NoSigner {
    fn has_credentials(&self) -> bool {
        false
    }

    fn sign(&self, request: PreparedRequest, _nonce: u64) -> Result<HttpRequest, ExchangeError> {
        Err(ExchangeError::authentication(
            &request.exchange,
            "no signer configured for private endpoints",
        ))
    }
}

struct NoClassifier;

impl ErrorClassifier for NoClassifier {
    fn check(&self, _response: &ResponseContext<'_>) -> Result<(), ExchangeError> {
        Ok(())
    }
}

pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    nonce: Option<Arc<dyn NonceSource>>,
    classifier: Option<Arc<dyn ErrorClassifier>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            nonce: None,
            classifier: None,
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Build with the reqwest transport.
    pub fn build(self) -> Result<RestClient<ReqwestTransport>, ExchangeError> {
        let transport = ReqwestTransport::new(
            TransportConfig::new(self.config.exchange_name.clone())
                .with_timeout(self.config.timeout_seconds),
        )?;
        self.build_with(transport)
    }

    pub fn build_with<T: HttpClient>(self, transport: T) -> Result<RestClient<T>, ExchangeError> {
        let limiter = match self.config.rate_limit {
            Some(period) => {
                let quota = Quota::with_period(period).ok_or_else(|| {
                    ConfigError::InvalidConfiguration(format!(
                        "{}: rate limit period must be non-zero",
                        self.config.exchange_name
                    ))
                })?;
                Some(Arc::new(RateLimiter::direct(quota)))
            }
            None => None,
        };

        Ok(RestClient {
            transport,
            config: self.config,
            signer: self.signer.unwrap_or_else(|| Arc::new(NoSigner)),
            nonce: self
                .nonce
                .unwrap_or_else(|| Arc::new(MonotonicNonce::new())),
            classifier: self.classifier.unwrap_or_else(|| Arc::new(NoClassifier)),
            limiter,
        })
    }
}

/// Request pipeline: path template, signing, transport, classification and
/// JSON decoding.
pub struct RestClient<T: HttpClient = ReqwestTransport> {
    transport: T,
    config: RestClientConfig,
    signer: Arc<dyn Signer>,
    nonce: Arc<dyn NonceSource>,
    classifier: Arc<dyn ErrorClassifier>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl<T: HttpClient> std::fmt::Debug for RestClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .field("has_credentials", &self.signer.has_credentials())
            .field("rate_limited", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: HttpClient> RestClient<T> {
    pub fn exchange(&self) -> &str {
        &self.config.exchange_name
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.has_credentials()
    }

    /// Fail before any I/O when a private call cannot be signed.
    pub fn require_credentials(&self) -> Result<(), ExchangeError> {
        if self.signer.has_credentials() {
            Ok(())
        } else {
            Err(ExchangeError::authentication(
                self.exchange(),
                format!("{} requires apiKey and secret credentials", self.exchange()),
            ))
        }
    }

    fn base_url(&self, api: &str) -> Result<&str, ExchangeError> {
        self.config
            .base_urls
            .get(api)
            .map(String::as_str)
            .ok_or_else(|| {
                ConfigError::InvalidConfiguration(format!(
                    "{}: no base URL for api '{}'",
                    self.exchange(),
                    api
                ))
                .into()
            })
    }

    /// Produce the wire request for `endpoint` without sending it.
    pub fn build_request(
        &self,
        endpoint: &Endpoint,
        mut params: Params,
    ) -> Result<HttpRequest, ExchangeError> {
        if endpoint.access == Access::Private {
            self.require_credentials()?;
        }
        let path = implode_path(endpoint.path, &mut params);
        let url = format!("{}/{}", self.base_url(endpoint.api)?.trim_end_matches('/'), path);

        match endpoint.access {
            Access::Public => Ok(public_request(endpoint.method.clone(), &url, &params)),
            Access::Private => {
                let nonce = self.nonce.next_nonce();
                self.signer.sign(
                    PreparedRequest {
                        exchange: self.config.exchange_name.clone(),
                        method: endpoint.method.clone(),
                        url,
                        path,
                        params,
                    },
                    nonce,
                )
            }
        }
    }

    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %endpoint.method, path = %endpoint.path))]
    pub async fn request(&self, endpoint: &Endpoint, params: Params) -> Result<Value, ExchangeError> {
        let request = self.build_request(endpoint, params)?;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        let response = self.transport.execute(request).await?;
        self.handle_response(&response)
    }

    fn handle_response(&self, response: &HttpResponse) -> Result<Value, ExchangeError> {
        let json: Option<Value> = serde_json::from_str(&response.body).ok();
        let context = ResponseContext {
            exchange: self.exchange(),
            status: response.status,
            body: &response.body,
            json: json.as_ref(),
        };

        if let Err(err) = self
            .classifier
            .check(&context)
            .and_then(|()| default_http_error(&context))
        {
            warn!(status = response.status, error = %err, "request failed");
            return Err(err);
        }

        match json {
            Some(value) => Ok(value),
            None if response.body.trim().is_empty() => Ok(Value::Null),
            None => Err(ExchangeError::invalid_response(
                self.exchange(),
                format!("response is not JSON: {}", response.body),
            )),
        }
    }
}

/// Unauthenticated request: sorted query for reads, JSON body for writes.
fn public_request(method: Method, url: &str, params: &Params) -> HttpRequest {
    if (method == Method::POST || method == Method::PUT) && !params.is_empty() {
        return HttpRequest {
            method,
            url: url.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(Value::Object(params.clone().into_iter().collect()).to_string()),
        };
    }
    HttpRequest {
        method,
        url: with_query(url, &urlencode(params)),
        headers: Vec::new(),
        body: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedTransport {
        response: HttpResponse,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for CannedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
            self.sent.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    const TICKER: Endpoint = Endpoint::public("public", Method::GET, "ticker/{market}");
    const BALANCE: Endpoint = Endpoint::private("private", Method::POST, "balance");

    fn client(status: u16, body: &str) -> RestClient<CannedTransport> {
        RestClientBuilder::new(
            RestClientConfig::new("test")
                .with_base_url("public", "https://api.test/v1/")
                .with_base_url("private", "https://api.test/private/"),
        )
        .build_with(CannedTransport::new(status, body))
        .unwrap()
    }

    #[test]
    fn test_public_request_sorted_query_without_path_params() {
        let client = client(200, "{}");
        let request = client
            .build_request(
                &TICKER,
                params([("market", json!("X_Y")), ("z", json!(1)), ("a", json!("b c"))]),
            )
            .unwrap();
        assert_eq!(request.url, "https://api.test/v1/ticker/X_Y?a=b%20c&z=1");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_private_call_without_credentials_sends_nothing() {
        let client = client(200, "{}");
        let err = client.request(&BALANCE, Params::new()).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Authentication));
        assert!(client.transport().sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_credentials_reported_before_base_url() {
        let client = RestClientBuilder::new(
            RestClientConfig::new("test").with_base_url("public", "https://api.test/v1/"),
        )
        .build_with(CannedTransport::new(200, "{}"))
        .unwrap();
        let err = client.build_request(&BALANCE, Params::new()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Authentication));
    }

    #[tokio::test]
    async fn test_non_2xx_uses_default_handler() {
        let client = client(429, "slow down");
        let err = client.request(&TICKER, params([("market", json!("X_Y"))])).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RateLimited));
        assert_eq!(err.exchange(), Some("test"));
    }

    #[tokio::test]
    async fn test_success_body_decoded() {
        let client = client(200, r#"{"ok":true}"#);
        let value = client.request(&TICKER, params([("market", json!("X_Y"))])).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_missing_base_url_is_config_error() {
        let client = client(200, "{}");
        let endpoint = Endpoint::public("other", Method::GET, "x");
        assert!(matches!(
            client.request(&endpoint, Params::new()).await,
            Err(ExchangeError::ConfigError(_))
        ));
    }
}
