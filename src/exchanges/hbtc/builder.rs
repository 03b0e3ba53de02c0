use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    Credentials, HttpClient, NonceSource, ReqwestTransport, RestClientBuilder, RestClientConfig,
};
use crate::exchanges::hbtc::{
    connector::HbtcConnector,
    errors::HbtcErrors,
    rest::{HbtcRest, PRIVATE_API, PUBLIC_API, QUOTE_API},
    signer::HbtcSigner,
    EXCHANGE_ID,
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.hbtc.com/openapi";
pub const API_VERSION: &str = "v1";

pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(2000);

/// Builder for HBTC connectors
///
/// Account and public endpoints live under `{root}/v1`, market data under
/// `{root}/quote/v1`.
pub struct HbtcBuilder {
    config: ExchangeConfig,
    rate_limit: Option<Duration>,
    nonce: Option<Arc<dyn NonceSource>>,
}

impl Default for HbtcBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HbtcBuilder {
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig::read_only(),
            rate_limit: Some(DEFAULT_RATE_LIMIT),
            nonce: None,
        }
    }

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

    pub fn with_rate_limit(mut self, rate_limit: Option<Duration>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Timestamps for signed requests; defaults to the system clock.
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
            .with_base_url(PUBLIC_API, format!("{}/{}", root, API_VERSION))
            .with_base_url(PRIVATE_API, format!("{}/{}", root, API_VERSION))
            .with_base_url(QUOTE_API, format!("{}/quote/{}", root, API_VERSION))
            .with_timeout(self.config.timeout_seconds)
            .with_rate_limit(self.rate_limit);

        let signer = HbtcSigner::new(Credentials::from_config(&self.config));
        let mut builder = RestClientBuilder::new(rest_config)
            .with_signer(Arc::new(signer))
            .with_classifier(Arc::new(HbtcErrors::new()));
        if let Some(nonce) = self.nonce {
            builder = builder.with_nonce_source(nonce);
        }
        builder
    }

    pub fn build(self) -> Result<HbtcConnector<ReqwestTransport>, ExchangeError> {
        let client = self.rest_builder().build()?;
        Ok(HbtcConnector::new(HbtcRest::new(client)))
    }

    pub fn build_with_transport<T: HttpClient>(
        self,
        transport: T,
    ) -> Result<HbtcConnector<T>, ExchangeError> {
        let client = self.rest_builder().build_with(transport)?;
        Ok(HbtcConnector::new(HbtcRest::new(client)))
    }
}

pub fn build_connector(config: ExchangeConfig) -> Result<HbtcConnector<ReqwestTransport>, ExchangeError> {
    HbtcBuilder::new().with_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::{params, FixedNonce};
    use crate::exchanges::hbtc::rest::{DELETE_ORDER, GET_BROKER_INFO, GET_DEPTH};
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_quote_and_public_urls() {
        let connector = HbtcBuilder::new().with_rate_limit(None).build().unwrap();
        let client = connector.rest().client();

        let depth = client
            .build_request(&GET_DEPTH, params([("symbol", json!("BTCUSDT")), ("limit", json!(5))]))
            .unwrap();
        assert_eq!(
            depth.url,
            "https://api.hbtc.com/openapi/quote/v1/depth?limit=5&symbol=BTCUSDT"
        );

        let info = client.build_request(&GET_BROKER_INFO, params([])).unwrap();
        assert_eq!(info.url, "https://api.hbtc.com/openapi/v1/brokerInfo");
    }

    #[test]
    fn test_signed_delete_carries_query() {
        let config = ExchangeConfig::new("key".to_string(), "secret".to_string());
        let connector = HbtcBuilder::new()
            .with_config(config)
            .with_base_url("https://sandbox.test/openapi/")
            .with_nonce_source(Arc::new(FixedNonce(99)))
            .build()
            .unwrap();
        let request = connector
            .rest()
            .client()
            .build_request(&DELETE_ORDER, params([("orderId", json!("5"))]))
            .unwrap();
        assert_eq!(request.method, Method::DELETE);
        assert!(request
            .url
            .starts_with("https://sandbox.test/openapi/v1/order?timestamp=99&orderId=5&signature="));
        assert_eq!(request.header("X-BH-APIKEY"), Some("key"));
    }
}
