use super::UpbitConnector;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::HttpClient;
use crate::core::normalize::{filter_by_since_limit, timeframe_seconds};
use crate::core::safe::{as_list, iso8601};
use crate::core::traits::{ExchangeConnector, MarketDataSource};
use crate::core::types::{Currency, Market, Ohlcv, OrderBook, Ticker, Trade};
use crate::exchanges::upbit::{
    conversions::{candle_route, parse_market, parse_ohlcv, parse_order_book, parse_trade, TICKER},
    rest::DEFAULT_TRADES_COUNT,
    EXCHANGE_ID,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::instrument;

impl<T: HttpClient> UpbitConnector<T> {
    /// Comma separated market ids for `symbols`, or for every cached market.
    fn market_ids(&self, symbols: Option<&[String]>) -> Result<String, ExchangeError> {
        let ids: Vec<String> = match symbols {
            Some(symbols) => symbols
                .iter()
                .map(|symbol| self.market(symbol).map(|m| m.id.clone()))
                .collect::<Result<_, _>>()?,
            None => {
                if !self.markets.is_loaded() {
                    return Err(ExchangeError::new(
                        ErrorKind::BadSymbol,
                        EXCHANGE_ID,
                        "markets not loaded, call load_markets() before fetching all tickers",
                    ));
                }
                let mut ids: Vec<String> = self.markets.markets().map(|m| m.id.clone()).collect();
                ids.sort();
                ids
            }
        };
        Ok(ids.join(","))
    }
}

#[async_trait]
impl<T: HttpClient> MarketDataSource for UpbitConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        let response = self.rest.get_market_all().await?;
        Ok(as_list(EXCHANGE_ID, &response)?
            .iter()
            .filter_map(parse_market)
            .collect())
    }

    async fn fetch_currencies(&self) -> Result<HashMap<String, Currency>, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_currencies"))
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_ticker(&market.id).await?;
        let raw = as_list(EXCHANGE_ID, &response)?
            .first()
            .unwrap_or(&Value::Null);
        Ok(self.normalizer().parse_ticker(raw, Some(market), &TICKER))
    }

    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<HashMap<String, Ticker>, ExchangeError> {
        let ids = self.market_ids(symbols)?;
        let response = self.rest.get_ticker(&ids).await?;
        let normalizer = self.normalizer();
        Ok(as_list(EXCHANGE_ID, &response)?
            .iter()
            .map(|raw| normalizer.parse_ticker(raw, None, &TICKER))
            .filter_map(|ticker| ticker.symbol.clone().map(|symbol| (symbol, ticker)))
            .collect())
    }

    /// Upbit always returns its full fifteen-level book; `limit` trims it.
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_orderbook(&market.id).await?;
        let raw = as_list(EXCHANGE_ID, &response)?
            .first()
            .unwrap_or(&Value::Null);
        let mut book = parse_order_book(&self.normalizer(), raw, Some(market))?;
        if let Some(limit) = limit {
            book.bids.truncate(limit as usize);
            book.asks.truncate(limit as usize);
        }
        Ok(book)
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_trades_ticks(&market.id, limit).await?;
        let normalizer = self.normalizer();
        let trades: Vec<Trade> = as_list(EXCHANGE_ID, &response)?
            .iter()
            .map(|raw| parse_trade(&normalizer, raw, Some(market)))
            .collect();
        Ok(filter_by_since_limit(trades, since, limit, |t| t.timestamp))
    }

    /// Candles oldest first. `since` becomes the `to` bound of a window of
    /// `limit` candles, 200 when not given.
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError> {
        let (route, unit) = candle_route(timeframe).ok_or_else(|| {
            ExchangeError::new(
                ErrorKind::BadRequest,
                EXCHANGE_ID,
                format!("{} has no {} candles", EXCHANGE_ID, timeframe),
            )
        })?;
        let market = self.market(symbol)?;
        let count = limit.unwrap_or(DEFAULT_TRADES_COUNT);
        let to = match since {
            Some(since) => timeframe_seconds(EXCHANGE_ID, timeframe)?
                .checked_mul(i64::from(count) * 1000)
                .and_then(|span| since.checked_add(span))
                .and_then(iso8601),
            None => None,
        };
        let response = self
            .rest
            .get_candles(route, unit, &market.id, count, to)
            .await?;
        let mut candles: Vec<Ohlcv> = as_list(EXCHANGE_ID, &response)?
            .iter()
            .filter_map(parse_ohlcv)
            .collect();
        candles.sort_by_key(|c| c.timestamp);
        Ok(filter_by_since_limit(candles, since, limit, |c| Some(c.timestamp)))
    }

    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_time"))
    }
}
