use super::UpbitConnector;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::{params, HttpClient};
use crate::core::normalize::{
    amount_to_precision, decimal_param, filter_by_since_limit, price_to_precision,
};
use crate::core::safe::as_list;
use crate::core::traits::{ExchangeConnector, OrderPlacer};
use crate::core::types::{Market, Order, OrderRequest, OrderSide, OrderType, Trade};
use crate::exchanges::upbit::{
    conversions::{order_type_name, parse_order},
    EXCHANGE_ID,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

pub const STATE_OPEN: &str = "wait";
pub const STATE_DONE: &str = "done";
pub const STATE_CANCELED: &str = "cancel";

fn side_name(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "bid",
        OrderSide::Sell => "ask",
    }
}

impl<T: HttpClient> UpbitConnector<T> {
    fn parse_orders(&self, response: &Value, market: Option<&Market>) -> Result<Vec<Order>, ExchangeError> {
        let normalizer = self.normalizer();
        Ok(as_list(EXCHANGE_ID, response)?
            .iter()
            .map(|raw| parse_order(&normalizer, raw, market))
            .collect())
    }

    /// Orders in one vendor state, optionally for one market.
    pub async fn fetch_orders_by_state(
        &self,
        state: &str,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self
            .rest
            .get_orders(state, market.map(|m| m.id.as_str()), limit)
            .await?;
        let orders = self.parse_orders(&response, market)?;
        Ok(filter_by_since_limit(orders, since, limit, |o| o.timestamp))
    }
}

#[async_trait]
impl<T: HttpClient> OrderPlacer for UpbitConnector<T> {
    /// A market buy is placed by cost, so it needs a reference `price`:
    /// the order spends `amount * price` of the quote currency.
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn create_order(&self, order: OrderRequest) -> Result<Order, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = self.market(&order.symbol)?;
        let is_buy = order.side == OrderSide::Buy;

        let mut request = params([
            ("market", json!(market.id)),
            ("side", json!(side_name(order.side))),
            ("ord_type", json!(order_type_name(&order.order_type, is_buy))),
        ]);
        match (&order.order_type, is_buy) {
            (OrderType::Limit, _) => {
                let price = order.price.ok_or_else(|| {
                    ExchangeError::arguments_required(EXCHANGE_ID, "limit orders require a price")
                })?;
                request.insert(
                    "volume".to_string(),
                    decimal_param(amount_to_precision(market, order.amount)),
                );
                request.insert(
                    "price".to_string(),
                    decimal_param(price_to_precision(market, price)),
                );
            }
            (OrderType::Market, true) => {
                let price = order.price.ok_or_else(|| {
                    ExchangeError::new(
                        ErrorKind::InvalidOrder,
                        EXCHANGE_ID,
                        "market buy orders require a price to compute their cost (amount * price)",
                    )
                })?;
                let cost = order.amount * price;
                request.insert(
                    "price".to_string(),
                    decimal_param(price_to_precision(market, cost)),
                );
            }
            (OrderType::Market, false) => {
                request.insert(
                    "volume".to_string(),
                    decimal_param(amount_to_precision(market, order.amount)),
                );
            }
            (OrderType::Other(other), _) => {
                return Err(ExchangeError::new(
                    ErrorKind::InvalidOrder,
                    EXCHANGE_ID,
                    format!("{} allows market and limit orders only, got {}", EXCHANGE_ID, other),
                ));
            }
        }
        if let Some(client_order_id) = &order.client_order_id {
            request.insert("identifier".to_string(), json!(client_order_id));
        }

        let response = self.rest.post_orders(request).await?;
        Ok(parse_order(&self.normalizer(), &response, Some(market)))
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self.rest.delete_order(id).await?;
        Ok(parse_order(&self.normalizer(), &response, market))
    }

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self.rest.get_order(id).await?;
        Ok(parse_order(&self.normalizer(), &response, market))
    }

    /// Open, filled and canceled orders, queried state by state.
    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let mut orders = Vec::new();
        for state in [STATE_OPEN, STATE_DONE, STATE_CANCELED] {
            orders.extend(self.fetch_orders_by_state(state, symbol, since, limit).await?);
        }
        orders.sort_by_key(|order| order.timestamp);
        Ok(filter_by_since_limit(orders, since, limit, |o| o.timestamp))
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.fetch_orders_by_state(STATE_OPEN, symbol, since, limit)
            .await
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.fetch_orders_by_state(STATE_DONE, symbol, since, limit)
            .await
    }

    async fn fetch_canceled_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.fetch_orders_by_state(STATE_CANCELED, symbol, since, limit)
            .await
    }

    async fn cancel_all_orders(&self, _symbol: Option<&str>) -> Result<Vec<String>, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "cancel_all_orders"))
    }

    async fn fetch_my_trades(
        &self,
        _symbol: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_my_trades"))
    }
}
