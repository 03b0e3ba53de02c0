use crate::core::{
    errors::ExchangeError,
    markets::MarketCache,
    types::{
        Balances, Currency, DepositAddress, Market, Ohlcv, Order, OrderBook, OrderRequest, Ticker,
        Trade, TradingFee, Transaction, WithdrawReceipt,
    },
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[async_trait]
pub trait MarketDataSource {
    /// Fetch every market the exchange lists
    async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError>;

    /// Currencies keyed by unified code
    async fn fetch_currencies(&self) -> Result<HashMap<String, Currency>, ExchangeError>;

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError>;

    /// Tickers keyed by symbol; `None` requests all markets.
    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<HashMap<String, Ticker>, ExchangeError>;

    async fn fetch_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError>;

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError>;

    /// Candles oldest first. `timeframe` uses unified names such as `1m`,
    /// `4h`, `1d`, `1w` and `1M`.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError>;

    /// Exchange server time in milliseconds
    async fn fetch_time(&self) -> Result<i64, ExchangeError>;
}

#[async_trait]
pub trait OrderPlacer {
    async fn create_order(&self, order: OrderRequest) -> Result<Order, ExchangeError>;

    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError>;

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError>;

    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError>;

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError>;

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError>;

    async fn fetch_canceled_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError>;

    /// Cancel every open order, or only those of `symbol`.
    /// Returns the ids the exchange reports as canceled.
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<String>, ExchangeError>;

    /// Fills of the account's own orders
    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError>;
}

#[async_trait]
pub trait AccountInfo {
    async fn fetch_balance(&self) -> Result<Balances, ExchangeError>;

    async fn fetch_trading_fee(&self, symbol: &str) -> Result<TradingFee, ExchangeError>;

    async fn fetch_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError>;

    async fn withdraw(
        &self,
        code: &str,
        amount: Decimal,
        address: &str,
        tag: Option<&str>,
    ) -> Result<WithdrawReceipt, ExchangeError>;

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError>;

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError>;
}

/// The full unified surface of one exchange.
#[async_trait]
pub trait ExchangeConnector: MarketDataSource + OrderPlacer + AccountInfo + Send + Sync {
    /// Connector id, e.g. `upbit`.
    fn id(&self) -> &str;

    fn markets(&self) -> &MarketCache;

    fn markets_mut(&mut self) -> &mut MarketCache;

    /// Populate the market cache once, or again when `reload` is set.
    ///
    /// Takes `&mut self`: loading is serialized with every other use of the
    /// connector, while read-only calls can run concurrently afterwards.
    async fn load_markets(&mut self, reload: bool) -> Result<&MarketCache, ExchangeError> {
        if reload || !self.markets().is_loaded() {
            let markets = self.fetch_markets().await?;
            self.markets_mut().replace(markets);
        }
        Ok(self.markets())
    }

    /// Market for a unified symbol from the loaded cache.
    fn market(&self, symbol: &str) -> Result<&Market, ExchangeError> {
        self.markets().market(self.id(), symbol)
    }
}
