use crate::core::errors::ExchangeError;
use crate::core::kernel::{params, Endpoint, HttpClient, Params, RestClient};
use reqwest::Method;
use serde_json::{json, Value};

pub const PUBLIC_API: &str = "public";
pub const QUOTE_API: &str = "quote";
pub const PRIVATE_API: &str = "private";

pub const GET_TIME: Endpoint = Endpoint::public(PUBLIC_API, Method::GET, "time");
pub const GET_BROKER_INFO: Endpoint = Endpoint::public(PUBLIC_API, Method::GET, "brokerInfo");

pub const GET_DEPTH: Endpoint = Endpoint::public(QUOTE_API, Method::GET, "depth");
pub const GET_TRADES: Endpoint = Endpoint::public(QUOTE_API, Method::GET, "trades");
pub const GET_TICKER_24HR: Endpoint = Endpoint::public(QUOTE_API, Method::GET, "ticker/24hr");
pub const GET_KLINES: Endpoint = Endpoint::public(QUOTE_API, Method::GET, "klines");

pub const GET_ORDER: Endpoint = Endpoint::private(PRIVATE_API, Method::GET, "order");
pub const GET_OPEN_ORDERS: Endpoint = Endpoint::private(PRIVATE_API, Method::GET, "openOrders");
pub const GET_HISTORY_ORDERS: Endpoint =
    Endpoint::private(PRIVATE_API, Method::GET, "historyOrders");
pub const GET_MY_TRADES: Endpoint = Endpoint::private(PRIVATE_API, Method::GET, "myTrades");
pub const GET_ACCOUNT: Endpoint = Endpoint::private(PRIVATE_API, Method::GET, "account");
pub const GET_DEPOSIT_ORDERS: Endpoint =
    Endpoint::private(PRIVATE_API, Method::GET, "depositOrders");
pub const GET_WITHDRAWAL_ORDERS: Endpoint =
    Endpoint::private(PRIVATE_API, Method::GET, "withdrawalOrders");
pub const POST_ORDER: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "order");
pub const POST_WITHDRAW: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "withdraw");
pub const DELETE_ORDER: Endpoint = Endpoint::private(PRIVATE_API, Method::DELETE, "order");

fn insert_opt(request: &mut Params, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        request.insert(key.to_string(), value);
    }
}

/// Query for the history style endpoints: optional symbol or token,
/// `startTime` and `limit`.
fn history_query(filter: Option<(&str, &str)>, since: Option<i64>, limit: Option<u32>) -> Params {
    let mut request = Params::new();
    if let Some((key, value)) = filter {
        request.insert(key.to_string(), json!(value));
    }
    insert_opt(&mut request, "startTime", since.map(|s| json!(s)));
    insert_opt(&mut request, "limit", limit.map(|l| json!(l)));
    request
}

/// HBTC REST endpoints
///
/// Responses are returned as the vendor sends them; HBTC has no success
/// envelope, failures carry a non-zero `code` and are rejected by the
/// classifier.
#[derive(Debug)]
pub struct HbtcRest<T: HttpClient> {
    client: RestClient<T>,
}

impl<T: HttpClient> HbtcRest<T> {
    pub const fn new(client: RestClient<T>) -> Self {
        Self { client }
    }

    pub const fn client(&self) -> &RestClient<T> {
        &self.client
    }

    pub async fn get_time(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_TIME, Params::new()).await
    }

    pub async fn get_broker_info(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_BROKER_INFO, Params::new()).await
    }

    /// Depth for one symbol; the venue caps `limit` at 40.
    pub async fn get_depth(&self, symbol: &str, limit: Option<u32>) -> Result<Value, ExchangeError> {
        let mut request = params([("symbol", json!(symbol))]);
        insert_opt(&mut request, "limit", limit.map(|l| json!(l)));
        self.client.request(&GET_DEPTH, request).await
    }

    pub async fn get_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Value, ExchangeError> {
        let mut request = params([("symbol", json!(symbol))]);
        insert_opt(&mut request, "limit", limit.map(|l| json!(l)));
        self.client.request(&GET_TRADES, request).await
    }

    /// One ticker object for `symbol`, or a list of all tickers.
    pub async fn get_ticker_24hr(&self, symbol: Option<&str>) -> Result<Value, ExchangeError> {
        let mut request = Params::new();
        insert_opt(&mut request, "symbol", symbol.map(|s| json!(s)));
        self.client.request(&GET_TICKER_24HR, request).await
    }

    /// Candles for `symbol`; the venue returns at most 500 per call.
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let mut request = history_query(Some(("symbol", symbol)), since, limit);
        request.insert("interval".to_string(), json!(interval));
        self.client.request(&GET_KLINES, request).await
    }

    pub async fn get_my_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = history_query(Some(("symbol", symbol)), since, limit);
        self.client.request(&GET_MY_TRADES, request).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_ORDER, params([("orderId", json!(order_id))]))
            .await
    }

    pub async fn get_open_orders(
        &self,
        symbol: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = history_query(symbol.map(|s| ("symbol", s)), None, limit);
        self.client.request(&GET_OPEN_ORDERS, request).await
    }

    pub async fn get_history_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = history_query(symbol.map(|s| ("symbol", s)), since, limit);
        self.client.request(&GET_HISTORY_ORDERS, request).await
    }

    pub async fn get_account(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_ACCOUNT, Params::new()).await
    }

    /// Deposits cannot be filtered by token server side.
    pub async fn get_deposit_orders(
        &self,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = history_query(None, since, limit);
        self.client.request(&GET_DEPOSIT_ORDERS, request).await
    }

    pub async fn get_withdrawal_orders(
        &self,
        token: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = history_query(token.map(|t| ("token", t)), since, limit);
        self.client.request(&GET_WITHDRAWAL_ORDERS, request).await
    }

    pub async fn post_order(&self, request: Params) -> Result<Value, ExchangeError> {
        self.client.request(&POST_ORDER, request).await
    }

    pub async fn delete_order(&self, order_id: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&DELETE_ORDER, params([("orderId", json!(order_id))]))
            .await
    }

    pub async fn post_withdraw(&self, request: Params) -> Result<Value, ExchangeError> {
        self.client.request(&POST_WITHDRAW, request).await
    }
}
