use crate::core::kernel::{HttpClient, ReqwestTransport};
use crate::core::markets::MarketCache;
use crate::core::normalize::Normalizer;
use crate::core::traits::ExchangeConnector;
use crate::exchanges::upbit::{conversions::SPLIT, rest::UpbitRest, EXCHANGE_ID};
use async_trait::async_trait;

pub mod account;
pub mod market_data;
pub mod trading;

/// Upbit spot connector
#[derive(Debug)]
pub struct UpbitConnector<T: HttpClient = ReqwestTransport> {
    rest: UpbitRest<T>,
    markets: MarketCache,
}

impl<T: HttpClient> UpbitConnector<T> {
    pub fn new(rest: UpbitRest<T>) -> Self {
        Self {
            rest,
            markets: MarketCache::new(),
        }
    }

    pub const fn rest(&self) -> &UpbitRest<T> {
        &self.rest
    }

    fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(EXCHANGE_ID, &self.markets, SPLIT)
    }
}

#[async_trait]
impl<T: HttpClient> ExchangeConnector for UpbitConnector<T> {
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
