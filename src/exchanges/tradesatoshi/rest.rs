use crate::core::errors::ExchangeError;
use crate::core::kernel::{params, Endpoint, HttpClient, Params, RestClient};
use reqwest::Method;
use serde_json::{json, Value};

pub const PUBLIC_API: &str = "public";
pub const PRIVATE_API: &str = "private";

pub const GET_CURRENCIES: Endpoint = Endpoint::public(PUBLIC_API, Method::GET, "getcurrencies");
pub const GET_MARKET_SUMMARY: Endpoint =
    Endpoint::public(PUBLIC_API, Method::GET, "getmarketsummary");
pub const GET_MARKET_SUMMARIES: Endpoint =
    Endpoint::public(PUBLIC_API, Method::GET, "getmarketsummaries");
pub const GET_ORDER_BOOK: Endpoint = Endpoint::public(PUBLIC_API, Method::GET, "getorderbook");
pub const GET_MARKET_HISTORY: Endpoint =
    Endpoint::public(PUBLIC_API, Method::GET, "getmarkethistory");

pub const GET_BALANCES: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "getbalances");
pub const GET_ORDER: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "getorder");
pub const GET_ORDERS: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "getorders");
pub const SUBMIT_ORDER: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "submitorder");
pub const SUBMIT_MARKET_ORDER: Endpoint =
    Endpoint::private(PRIVATE_API, Method::POST, "submitmarketorder");
pub const GET_TRADE_HISTORY: Endpoint =
    Endpoint::private(PRIVATE_API, Method::POST, "gettradehistory");
pub const CANCEL_ORDER: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "cancelorder");
pub const GENERATE_ADDRESS: Endpoint =
    Endpoint::private(PRIVATE_API, Method::POST, "generateaddress");
pub const SUBMIT_WITHDRAW: Endpoint =
    Endpoint::private(PRIVATE_API, Method::POST, "submitwithdraw");
pub const GET_DEPOSITS: Endpoint = Endpoint::private(PRIVATE_API, Method::POST, "getdeposits");
pub const GET_WITHDRAWALS: Endpoint =
    Endpoint::private(PRIVATE_API, Method::POST, "getwithdrawals");

/// The `result` member of a TradeSatoshi envelope.
pub fn result_of(envelope: &Value) -> &Value {
    envelope.get("result").unwrap_or(&Value::Null)
}

/// History endpoints only honour `count` above their default page of 20.
fn with_count(mut request: Params, limit: Option<u32>) -> Params {
    if let Some(limit) = limit.filter(|l| *l > 20) {
        request.insert("count".to_string(), json!(limit));
    }
    request
}

/// Thin typed wrapper over the TradeSatoshi endpoints
///
/// Every method returns the full `{success, message, result}` envelope;
/// failed envelopes have already been rejected by the classifier.
#[derive(Debug)]
pub struct TradeSatoshiRest<T: HttpClient> {
    client: RestClient<T>,
}

impl<T: HttpClient> TradeSatoshiRest<T> {
    pub const fn new(client: RestClient<T>) -> Self {
        Self { client }
    }

    pub const fn client(&self) -> &RestClient<T> {
        &self.client
    }

    pub async fn get_currencies(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_CURRENCIES, Params::new()).await
    }

    pub async fn get_market_summaries(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_MARKET_SUMMARIES, Params::new()).await
    }

    pub async fn get_market_summary(&self, market_id: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_MARKET_SUMMARY, params([("market", json!(market_id))]))
            .await
    }

    pub async fn get_order_book(
        &self,
        market_id: &str,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let mut request = params([("market", json!(market_id)), ("type", json!("both"))]);
        if let Some(limit) = limit {
            request.insert("depth".to_string(), json!(limit));
        }
        self.client.request(&GET_ORDER_BOOK, request).await
    }

    pub async fn get_market_history(
        &self,
        market_id: &str,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = with_count(params([("market", json!(market_id))]), limit);
        self.client.request(&GET_MARKET_HISTORY, request).await
    }

    pub async fn get_balances(&self) -> Result<Value, ExchangeError> {
        self.client.request(&GET_BALANCES, Params::new()).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GET_ORDER, params([("OrderId", json!(order_id))]))
            .await
    }

    /// Orders for one market id, or every market when `None`.
    pub async fn get_orders(
        &self,
        market_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = with_count(params([("Market", json!(market_id.unwrap_or("all")))]), limit);
        self.client.request(&GET_ORDERS, request).await
    }

    pub async fn submit_order(&self, market: bool, request: Params) -> Result<Value, ExchangeError> {
        let endpoint = if market {
            &SUBMIT_MARKET_ORDER
        } else {
            &SUBMIT_ORDER
        };
        self.client.request(endpoint, request).await
    }

    pub async fn cancel_order(&self, order_id: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(
                &CANCEL_ORDER,
                params([("Type", json!("Single")), ("OrderId", json!(order_id))]),
            )
            .await
    }

    /// Cancel every order of one market id, or of every market when `None`.
    pub async fn cancel_orders(&self, market_id: Option<&str>) -> Result<Value, ExchangeError> {
        let request = match market_id {
            Some(market_id) => params([("Type", json!("Market")), ("Market", json!(market_id))]),
            None => params([("Type", json!("All"))]),
        };
        self.client.request(&CANCEL_ORDER, request).await
    }

    pub async fn get_trade_history(
        &self,
        market_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = with_count(params([("Market", json!(market_id.unwrap_or("all")))]), limit);
        self.client.request(&GET_TRADE_HISTORY, request).await
    }

    pub async fn generate_address(&self, currency_id: &str) -> Result<Value, ExchangeError> {
        self.client
            .request(&GENERATE_ADDRESS, params([("Currency", json!(currency_id))]))
            .await
    }

    pub async fn submit_withdraw(&self, request: Params) -> Result<Value, ExchangeError> {
        self.client.request(&SUBMIT_WITHDRAW, request).await
    }

    pub async fn get_deposits(
        &self,
        currency_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = with_count(params([("Currency", json!(currency_id.unwrap_or("all")))]), limit);
        self.client.request(&GET_DEPOSITS, request).await
    }

    pub async fn get_withdrawals(
        &self,
        currency_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value, ExchangeError> {
        let request = with_count(params([("Currency", json!(currency_id.unwrap_or("all")))]), limit);
        self.client.request(&GET_WITHDRAWALS, request).await
    }
}
