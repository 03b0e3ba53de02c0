use crate::core::errors::ExchangeError;
use crate::core::kernel::{params, Endpoint, HttpClient, Params, RestClient};
use reqwest::Method;
use serde_json::{json, Value};

pub const API: &str = "api";

pub const GET_MARKET_ALL: Endpoint = Endpoint::public(API, Method::GET, "market/all");
pub const GET_TICKER: Endpoint = Endpoint::public(API, Method::GET, "ticker");
pub const GET_ORDERBOOK: Endpoint = Endpoint::public(API, Method::GET, "orderbook");
pub const GET_TRADES_TICKS: Endpoint = Endpoint::public(API, Method::GET, "trades/ticks");
pub const GET_CANDLES: Endpoint = Endpoint::public(API, Method::GET, "candles/{timeframe}");
pub const GET_CANDLES_MINUTES: Endpoint =
    Endpoint::public(API, Method::GET, "candles/minutes/{unit}");

pub const GET_ACCOUNTS: Endpoint = Endpoint::private(API, Method::GET, "accounts");
pub const GET_ORDER: Endpoint = Endpoint::private(API, Method::GET, "order");
pub const GET_ORDERS: Endpoint = Endpoint::private(API, Method::GET, "orders");
pub const GET_ORDERS_CHANCE: Endpoint = Endpoint::private(API, Method::GET, "orders/chance");
pub const GET_DEPOSITS: Endpoint = Endpoint::private(API, Method::GET, "deposits");
pub const GET_WITHDRAWS: Endpoint = Endpoint::private(API, Method::GET, "withdraws");
pub const GET_COIN_ADDRESS: Endpoint =
    Endpoint::private(API, Method::GET, "deposits/coin_address");
pub const POST_ORDERS: Endpoint = Endpoint::private(API, Method::POST, "orders");
pub const POST_WITHDRAW_COIN: Endpoint = Endpoint::private(API, Method::POST, "withdraws/coin");
pub const POST_WITHDRAW_KRW: Endpoint = Endpoint::private(API, Method::POST, "withdraws/krw");
pub const DELETE_ORDER: Endpoint = Endpoint::private(API, Method::DELETE, "order");

/// Default page size of `trades/ticks` and of the candle routes.
pub const DEFAULT_TRADES_COUNT: u32 = 200;

fn history_query(currency: Option<&str>, limit: Option<u32>) -> Params {
    let mut request = Params::new();
    if let Some(currency) = currency {
        request.insert("currency".to_string(), json!(currency));
    }
    if let Some(limit) = limit {
        request.insert("limit".to_string(), json!(limit));
    }
    request
}

/// Upbit REST endpoints
///
/// Failures arrive as `{"error": {"name", "message"}}` with a 4xx status
/// and are rejected by the classifier; everything else is returned as sent.
#[derive(Debug)]
pub struct UpbitRest<T: HttpClient> {
    client: RestClient<T>,
}

impl<T: HttpClient> UpbitRest<T> {
    pub const fn new(client: RestClient<T>) -> Self {
        Self { client }
    }

    pub const fn client(&self) -> &RestClient<T> {
        &self.client
    }

    pub async fn get_market_all(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_MARKET_ALL, Params::new()).await
    }

    /// Tickers for a comma separated list of market ids.
    pub async fn get_ticker(&self, markets: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_TICKER, params([("markets", json!(markets))]))
            .await
    }

    pub async fn get_orderbook(&self, markets: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_ORDERBOOK, params([("markets", json!(markets))]))
            .await
    }

    pub async fn get_trades_ticks(
        &self,
        market: &str,
        count: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = params([
            ("market", json!(market)),
            ("count", json!(count.unwrap_or(DEFAULT_TRADES_COUNT))),
        ]);
        self.client.request(&GET_TRADES_TICKS, request).await
    }

    /// Candles ending at `to` (newest first). Minute candles take a `unit`,
    /// the other routes are named by `timeframe`.
    pub async fn get_candles(
        &self,
        timeframe: &str,
        unit: Option<u32>,
        market: &str,
        count: u32,
        to: Option<String>,
    ) -> Result<Value, ExchangeError> {
        let mut request = params([("market", json!(market)), ("count", json!(count))]);
        if let Some(to) = to {
            request.insert("to".to_string(), json!(to));
        }
        let endpoint = match unit {
            Some(unit) => {
                request.insert("unit".to_string(), json!(unit));
                &GET_CANDLES_MINUTES
            }
            None => {
                request.insert("timeframe".to_string(), json!(timeframe));
                &GET_CANDLES
            }
        };
        self.client.request(endpoint, request).await
    }

    pub async fn get_orders_chance(&self, market: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_ORDERS_CHANCE, params([("market", json!(market))]))
            .await
    }

    pub async fn get_accounts(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_ACCOUNTS, Params::new()).await
    }

    pub async fn get_order(&self, uuid: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_ORDER, params([("uuid", json!(uuid))]))
            .await
    }

    /// Orders in one `state`: `wait`, `done` or `cancel`.
    pub async fn get_orders(
        &self,
        state: &str,
        market: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let mut request = params([("state", json!(state))]);
        if let Some(market) = market {
            request.insert("market".to_string(), json!(market));
        }
        if let Some(limit) = limit {
            request.insert("limit".to_string(), json!(limit));
        }
        self.client.request(&GET_ORDERS, request).await
    }

    pub async fn get_deposits(
        &self,
        currency: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_DEPOSITS, history_query(currency, limit))
            .await
    }

    pub async fn get_withdraws(
        &self,
        currency: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_WITHDRAWS, history_query(currency, limit))
            .await
    }

    pub async fn get_coin_address(&self, currency: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_COIN_ADDRESS, params([("currency", json!(currency))]))
            .await
    }

    pub async fn post_orders(&self, request: Params) -> Result<Value, ExchangeError> {
        self.client.request(&POST_ORDERS, request).await
    }

    pub async fn delete_order(&self, uuid: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&DELETE_ORDER, params([("uuid", json!(uuid))]))
            .await
    }

    pub async fn post_withdraw_coin(&self, request: Params) -> Result<Value, ExchangeError> {
        self.client.request(&POST_WITHDRAW_COIN, request).await
    }

    pub async fn post_withdraw_krw(&self, request: Params) -> Result<Value, ExchangeError> {
        self.client.request(&POST_WITHDRAW_KRW, request).await
    }
}
