use crate::core::config::ExchangeConfig;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::traits::ExchangeConnector;
use crate::exchanges::{hbtc, tradesatoshi, upbit};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Supported exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    TradeSatoshi,
    Hbtc,
    Upbit,
}

impl ExchangeKind {
    pub const ALL: [Self; 3] = [Self::TradeSatoshi, Self::Hbtc, Self::Upbit];

    /// Connector id, also the prefix of its environment variables.
    pub const fn id(self) -> &'static str {
        match self {
            Self::TradeSatoshi => tradesatoshi::EXCHANGE_ID,
            Self::Hbtc => hbtc::EXCHANGE_ID,
            Self::Upbit => upbit::EXCHANGE_ID,
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExchangeKind {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| {
                ExchangeError::new(
                    ErrorKind::NotSupported,
                    s,
                    format!(
                        "unknown exchange '{}', expected one of: {}",
                        s,
                        Self::ALL.map(Self::id).join(", ")
                    ),
                )
            })
    }
}

/// Factory for creating exchange connectors
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Create a connector for `kind` over the reqwest transport.
    pub fn create_connector(
        kind: ExchangeKind,
        config: ExchangeConfig,
    ) -> Result<Box<dyn ExchangeConnector>, ExchangeError> {
        debug!(exchange = %kind, authenticated = config.has_credentials(), "creating connector");
        Ok(match kind {
            ExchangeKind::TradeSatoshi => Box::new(tradesatoshi::build_connector(config)?),
            ExchangeKind::Hbtc => Box::new(hbtc::build_connector(config)?),
            ExchangeKind::Upbit => Box::new(upbit::build_connector(config)?),
        })
    }

    /// Credentials from `{ID}_API_KEY` and `{ID}_SECRET_KEY` when both are
    /// set, otherwise a read-only connector.
    pub fn create_from_env(kind: ExchangeKind) -> Result<Box<dyn ExchangeConnector>, ExchangeError> {
        let config = ExchangeConfig::from_env(kind.id()).unwrap_or_else(|e| {
            debug!(exchange = %kind, reason = %e, "no credentials in environment, using read-only config");
            ExchangeConfig::read_only()
        });
        Self::create_connector(kind, config)
    }

    pub fn available_exchanges() -> Vec<ExchangeKind> {
        ExchangeKind::ALL.to_vec()
    }
}
