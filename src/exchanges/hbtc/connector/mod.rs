use crate::core::kernel::{HttpClient, ReqwestTransport};
use crate::core::markets::MarketCache;
use crate::core::normalize::Normalizer;
use crate::core::traits::ExchangeConnector;
use crate::exchanges::hbtc::{conversions::SPLIT, rest::HbtcRest, EXCHANGE_ID};
use async_trait::async_trait;

pub mod account;
pub mod market_data;
pub mod trading;

/// HBTC spot connector
#[derive(Debug)]
pub struct HbtcConnector<T: HttpClient = ReqwestTransport> {
    rest: HbtcRest<T>,
    markets: MarketCache,
}

impl<T: HttpClient> HbtcConnector<T> {
    pub fn new(rest: HbtcRest<T>) -> Self {
        Self {
            rest,
            markets: MarketCache::new(),
        }
    }

    pub const fn rest(&self) -> &HbtcRest<T> {
        &self.rest
    }

    fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(EXCHANGE_ID, &self.markets, SPLIT)
    }
}

#[async_trait]
impl<T: HttpClient> ExchangeConnector for HbtcConnector<T> {
    fn id(&self) -> &str {
        EXCHANGE_ID
    }

    fn markets(&self) -> &MarketCache {
        &self.markets
    }

    fn markets_mut(&mut self) -> &mut MarketCache {
        &mut self.markets
    }
}
