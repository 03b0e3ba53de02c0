use super::TradeSatoshiConnector;
use crate::core::errors::ExchangeError;
use crate::core::kernel::HttpClient;
use crate::core::normalize::filter_by_since_limit;
use crate::core::safe::as_list;
use crate::core::traits::{ExchangeConnector, MarketDataSource};
use crate::core::types::{Currency, Market, Ohlcv, OrderBook, Ticker, Trade};
use crate::exchanges::tradesatoshi::{
    conversions::{parse_currency, parse_market, parse_trade, BOOK_LEVEL, TICKER},
    rest::result_of,
    EXCHANGE_ID,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::instrument;

#[async_trait]
impl<T: HttpClient> MarketDataSource for TradeSatoshiConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        let response = self.rest.get_market_summaries().await?;
        Ok(as_list(EXCHANGE_ID, result_of(&response))?
            .iter()
            .filter_map(parse_market)
            .collect())
    }

    async fn fetch_currencies(&self) -> Result<HashMap<String, Currency>, ExchangeError> {
        let response = self.rest.get_currencies().await?;
        let normalizer = self.normalizer();
        Ok(as_list(EXCHANGE_ID, result_of(&response))?
            .iter()
            .filter_map(|raw| parse_currency(&normalizer, raw))
            .map(|currency| (currency.code.clone(), currency))
            .collect())
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_market_summary(&market.id).await?;
        Ok(self
            .normalizer()
            .parse_ticker(result_of(&response), Some(market), &TICKER))
    }

    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<HashMap<String, Ticker>, ExchangeError> {
        let response = self.rest.get_market_summaries().await?;
        let normalizer = self.normalizer();
        let mut tickers = HashMap::new();
        for raw in as_list(EXCHANGE_ID, result_of(&response))? {
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
        let response = self.rest.get_order_book(&market.id, limit).await?;
        let book = result_of(&response);
        self.normalizer().parse_order_book(
            &book["buy"],
            &book["sell"],
            &BOOK_LEVEL,
            Some(market.symbol.clone()),
            None,
        )
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let market = self.market(symbol)?;
        let response = self.rest.get_market_history(&market.id, limit).await?;
        let normalizer = self.normalizer();
        let trades: Vec<Trade> = as_list(EXCHANGE_ID, result_of(&response))?
            .iter()
            .map(|raw| parse_trade(&normalizer, raw, Some(market)))
            .collect();
        Ok(filter_by_since_limit(trades, since, limit, |t| t.timestamp))
    }

    async fn fetch_ohlcv(
        &self,
        _symbol: &str,
        _timeframe: &str,
        _since: Option<i64>,
        _limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_ohlcv"))
    }

    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_time"))
    }
}
