use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    Credentials, HttpClient, NonceSource, ReqwestTransport, RestClientBuilder, RestClientConfig,
};
use crate::exchanges::upbit::{
    connector::UpbitConnector, errors::UpbitErrors, rest::UpbitRest, rest::API,
    signer::UpbitSigner, EXCHANGE_ID,
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.upbit.com/v1";

pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(1000);

/// Builder for Upbit connectors; the base URL includes the API version.
pub struct UpbitBuilder {
    config: ExchangeConfig,
    rate_limit: Option<Duration>,
    nonce: Option<Arc<dyn NonceSource>>,
}

impl Default for UpbitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UpbitBuilder {
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

    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    fn rest_builder(self) -> RestClientBuilder {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let rest_config = RestClientConfig::new(EXCHANGE_ID)
            .with_base_url(API, base_url)
            .with_timeout(self.config.timeout_seconds)
            .with_rate_limit(self.rate_limit);

        let signer = UpbitSigner::new(Credentials::from_config(&self.config));
        let mut builder = RestClientBuilder::new(rest_config)
            .with_signer(Arc::new(signer))
            .with_classifier(Arc::new(UpbitErrors::new()));
        if let Some(nonce) = self.nonce {
            builder = builder.with_nonce_source(nonce);
        }
        builder
    }

    pub fn build(self) -> Result<UpbitConnector<ReqwestTransport>, ExchangeError> {
        let client = self.rest_builder().build()?;
        Ok(UpbitConnector::new(UpbitRest::new(client)))
    }

    pub fn build_with_transport<T: HttpClient>(
        self,
        transport: T,
    ) -> Result<UpbitConnector<T>, ExchangeError> {
        let client = self.rest_builder().build_with(transport)?;
        Ok(UpbitConnector::new(UpbitRest::new(client)))
    }
}

pub fn build_connector(
    config: ExchangeConfig,
) -> Result<UpbitConnector<ReqwestTransport>, ExchangeError> {
    UpbitBuilder::new().with_config(config).build()
}
