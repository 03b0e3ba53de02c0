use crate::core::kernel::{HttpClient, ReqwestTransport};
use crate::core::markets::MarketCache;
use crate::core::normalize::Normalizer;
use crate::core::traits::ExchangeConnector;
use crate::exchanges::tradesatoshi::{conversions::SPLIT, rest::TradeSatoshiRest, EXCHANGE_ID};
use async_trait::async_trait;

pub mod account;
pub mod market_data;
pub mod trading;

/// TradeSatoshi connector
///
/// Market data, trading and account operations live in the sibling
/// modules; all of them read the same market cache.
#[derive(Debug)]
pub struct TradeSatoshiConnector<T: HttpClient = ReqwestTransport> {
    rest: TradeSatoshiRest<T>,
    markets: MarketCache,
}

impl<T: HttpClient> TradeSatoshiConnector<T> {
    pub fn new(rest: TradeSatoshiRest<T>) -> Self {
        Self {
            rest,
            markets: MarketCache::new(),
        }
    }

    pub const fn rest(&self) -> &TradeSatoshiRest<T> {
        &self.rest
    }

    fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(EXCHANGE_ID, &self.markets, SPLIT)
    }
}

#[async_trait]
impl<T: HttpClient> ExchangeConnector for TradeSatoshiConnector<T> {
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
