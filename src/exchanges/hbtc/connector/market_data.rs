use super::HbtcConnector;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::HttpClient;
use crate::core::normalize::filter_by_since_limit;
use crate::core::safe::{as_list, get_timestamp};
use crate::core::traits::{ExchangeConnector, MarketDataSource};
use crate::core::types::{Currency, Market, Ohlcv, OrderBook, Ticker, Trade};
use crate::exchanges::hbtc::{
    conversions::{parse_market, parse_ohlcv, parse_trade, BOOK_LEVEL, TICKER, TIMEFRAMES},
    EXCHANGE_ID,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::instrument;

#[async_trait]
impl<T: HttpClient> MarketDataSource for HbtcConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        let response = self.rest.get_broker_info().await?;
        let symbols: &[Value] = match response.get("symbols") {
            Some(symbols) => as_list(EXCHANGE_ID, symbols)?,
            None => &[],
        };
        Ok(symbols.iter().filter_map(parse_market).collect())
    }

    async fn fetch_currencies(&self) -> Result<HashMap<String, Currency>, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_currencies"))
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_ticker_24hr(Some(&market.id)).await?;
        let raw = match &response {
            Value::Array(tickers) => tickers.first().unwrap_or(&Value::Null),
            other => other,
        };
        Ok(self.normalizer().parse_ticker(raw, Some(market), &TICKER))
    }

    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<HashMap<String, Ticker>, ExchangeError> {
        let response = self.rest.get_ticker_24hr(None).await?;
        let normalizer = self.normalizer();
        let mut tickers = HashMap::new();
        for raw in as_list(EXCHANGE_ID, &response)? {
            let ticker = normalizer.parse_ticker(raw, None, &TICKER);
            let Some(symbol) = ticker.symbol.clone() else {
                continue;
            };
            if symbols.map_or(true, |wanted| wanted.contains(&symbol)) {
                tickers.insert(symbol, ticker);
            }
        }
        Ok(tickers)
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_depth(&market.id, limit).await?;
        self.normalizer().parse_order_book(
            &response["bids"],
            &response["asks"],
            &BOOK_LEVEL,
            Some(market.symbol.clone()),
            get_timestamp(&response, &["time"]),
        )
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_trades(&market.id, limit).await?;
        let normalizer = self.normalizer();
        let trades: Vec<Trade> = as_list(EXCHANGE_ID, &response)?
            .iter()
            .map(|raw| parse_trade(&normalizer, raw, Some(market)))
            .collect();
        Ok(filter_by_since_limit(trades, since, limit, |t| t.timestamp))
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError> {
        if !TIMEFRAMES.contains(&timeframe) {
            return Err(ExchangeError::new(
                ErrorKind::BadRequest,
                EXCHANGE_ID,
                format!("unsupported timeframe {:?}", timeframe),
            ));
        }
        let market = self.market(symbol)?;
        let response = self
            .rest
            .get_klines(&market.id, timeframe, since, limit)
            .await?;
        let candles: Vec<Ohlcv> = as_list(EXCHANGE_ID, &response)?
            .iter()
            .filter_map(parse_ohlcv)
            .collect();
        Ok(filter_by_since_limit(candles, since, limit, |c| Some(c.timestamp)))
    }

    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        let response = self.rest.get_time().await?;
        get_timestamp(&response, &["serverTime"]).ok_or_else(|| {
            ExchangeError::invalid_response(EXCHANGE_ID, "time response without serverTime")
        })
    }
}
