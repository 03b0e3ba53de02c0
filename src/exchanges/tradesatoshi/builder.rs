use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    Credentials, HttpClient, NonceSource, ReqwestTransport, RestClientBuilder, RestClientConfig,
};
use crate::exchanges::tradesatoshi::{
    connector::TradeSatoshiConnector,
    errors::TradeSatoshiErrors,
    rest::{TradeSatoshiRest, PRIVATE_API, PUBLIC_API},
    signer::TradeSatoshiSigner,
    EXCHANGE_ID,
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.tradesatoshi.com/api";

/// Two seconds between calls.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(2000);

/// Builder for TradeSatoshi connectors
///
/// The base URL is the API root; `/public` and `/private` are appended.
pub struct TradeSatoshiBuilder {
    config: ExchangeConfig,
    rate_limit: Option<Duration>,
    nonce: Option<Arc<dyn NonceSource>>,
}

impl Default for TradeSatoshiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeSatoshiBuilder {
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig::read_only(),
            rate_limit: Some(DEFAULT_RATE_LIMIT),
            nonce: None,
        }
    }

    /// Credentials, timeout and overrides from `config`.
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        if let Some(ms) = config.rate_limit_ms {
            self.rate_limit = (ms > 0).then(|| Duration::from_millis(ms));
        }
        self.config = config;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Minimum spacing between requests; `None` turns pacing off.
    pub fn with_rate_limit(mut self, rate_limit: Option<Duration>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    fn rest_builder(self) -> RestClientBuilder {
        let root = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let rest_config = RestClientConfig::new(EXCHANGE_ID)
            .with_base_url(PUBLIC_API, format!("{}/public", root))
            .with_base_url(PRIVATE_API, format!("{}/private", root))
            .with_timeout(self.config.timeout_seconds)
            .with_rate_limit(self.rate_limit);

        let signer = TradeSatoshiSigner::new(Credentials::from_config(&self.config));
        let mut builder = RestClientBuilder::new(rest_config)
            .with_signer(Arc::new(signer))
            .with_classifier(Arc::new(TradeSatoshiErrors::new()));
        if let Some(nonce) = self.nonce {
            builder = builder.with_nonce_source(nonce);
        }
        builder
    }

    pub fn build(self) -> Result<TradeSatoshiConnector<ReqwestTransport>, ExchangeError> {
        let client = self.rest_builder().build()?;
        Ok(TradeSatoshiConnector::new(TradeSatoshiRest::new(client)))
    }

    /// Build over a caller-supplied transport.
    pub fn build_with_transport<T: HttpClient>(
        self,
        transport: T,
    ) -> Result<TradeSatoshiConnector<T>, ExchangeError> {
        let client = self.rest_builder().build_with(transport)?;
        Ok(TradeSatoshiConnector::new(TradeSatoshiRest::new(client)))
    }
}

/// Connector for `config` with the reqwest transport.
pub fn build_connector(
    config: ExchangeConfig,
) -> Result<TradeSatoshiConnector<ReqwestTransport>, ExchangeError> {
    TradeSatoshiBuilder::new().with_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::{params, Endpoint, FixedNonce};
    use crate::exchanges::tradesatoshi::rest::{GET_BALANCES, GET_MARKET_SUMMARY};
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_public_url_from_root() {
        let connector = TradeSatoshiBuilder::new()
            .with_base_url("https://sandbox.test/api/")
            .with_rate_limit(None)
            .build()
            .unwrap();
        let request = connector
            .rest()
            .client()
            .build_request(&GET_MARKET_SUMMARY, params([("market", json!("LTC_BTC"))]))
            .unwrap();
        assert_eq!(
            request.url,
            "https://sandbox.test/api/public/getmarketsummary?market=LTC_BTC"
        );
        assert_eq!(request.method, Method::GET);
    }

    #[test]
    fn test_private_request_uses_nonce_source() {
        let config = ExchangeConfig::new("key".to_string(), "c2VjcmV0".to_string());
        let connector = TradeSatoshiBuilder::new()
            .with_config(config)
            .with_nonce_source(Arc::new(FixedNonce(1234)))
            .build()
            .unwrap();
        let request = connector
            .rest()
            .client()
            .build_request(&GET_BALANCES, params([("Currency", json!("BTC"))]))
            .unwrap();
        assert_eq!(
            request.url,
            "https://www.tradesatoshi.com/api/private/getbalances"
        );
        assert!(request
            .header("Authorization")
            .is_some_and(|h| h.starts_with("Basic key:") && h.ends_with(":1234")));
    }

    #[test]
    fn test_read_only_has_no_credentials() {
        let connector = build_connector(ExchangeConfig::read_only()).unwrap();
        assert!(!connector.rest().client().has_credentials());
        let endpoint: &Endpoint = &GET_BALANCES;
        assert!(connector
            .rest()
            .client()
            .build_request(endpoint, params([]))
            .is_err());
    }
}
