use super::HbtcConnector;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::{params, HttpClient};
use crate::core::normalize::{
    amount_to_precision, decimal_param, filter_by_since_limit, price_to_precision,
};
use crate::core::precision::truncate_to_places;
use crate::core::safe::as_list;
use crate::core::traits::{ExchangeConnector, OrderPlacer};
use crate::core::types::{Market, Order, OrderRequest, OrderSide, OrderType, Trade};
use crate::exchanges::hbtc::{
    conversions::{parse_order, parse_trade},
    EXCHANGE_ID,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::instrument;

impl<T: HttpClient> HbtcConnector<T> {
    fn parse_orders(
        &self,
        response: &Value,
        market: Option<&Market>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let normalizer = self.normalizer();
        Ok(as_list(EXCHANGE_ID, response)?
            .iter()
            .map(|raw| parse_order(&normalizer, raw, market))
            .collect())
    }
}

/// Market buys are sized in quote currency: `amount * price`, cut to the
/// price precision.
fn market_buy_cost(market: &Market, order: &OrderRequest) -> Result<Value, ExchangeError> {
    let price = order.price.ok_or_else(|| {
        ExchangeError::new(
            ErrorKind::InvalidOrder,
            EXCHANGE_ID,
            format!(
                "{} market buy orders require a price to compute the cost to spend",
                EXCHANGE_ID
            ),
        )
    })?;
    let cost = order.amount * price;
    Ok(decimal_param(
        market
            .precision
            .price
            .map_or(cost, |places| truncate_to_places(cost, places)),
    ))
}

#[async_trait]
impl<T: HttpClient> OrderPlacer for HbtcConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn create_order(&self, order: OrderRequest) -> Result<Order, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = self.market(&order.symbol)?;

        let mut request = params([
            ("symbol", json!(market.id)),
            ("side", json!(order.side.as_str().to_uppercase())),
        ]);
        if let Some(client_order_id) = &order.client_order_id {
            request.insert("newClientOrderId".to_string(), json!(client_order_id));
        }
        match (&order.order_type, order.side) {
            (OrderType::Limit, _) => {
                let price = order.price.ok_or_else(|| {
                    ExchangeError::arguments_required(EXCHANGE_ID, "limit orders require a price")
                })?;
                request.insert("type".to_string(), json!("LIMIT"));
                request.insert(
                    "price".to_string(),
                    decimal_param(price_to_precision(market, price)),
                );
                request.insert(
                    "quantity".to_string(),
                    decimal_param(amount_to_precision(market, order.amount)),
                );
            }
            (OrderType::Market, OrderSide::Buy) => {
                request.insert("type".to_string(), json!("MARKET"));
                request.insert("quantity".to_string(), market_buy_cost(market, &order)?);
            }
            (OrderType::Market, OrderSide::Sell) => {
                request.insert("type".to_string(), json!("MARKET"));
                request.insert(
                    "quantity".to_string(),
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

        let response = self.rest.post_order(request).await?;
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

    /// Open orders followed by order history, each order once.
    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let open = self.fetch_open_orders(symbol, since, None).await?;
        let closed = self.fetch_closed_orders(symbol, since, None).await?;
        let mut seen = HashSet::new();
        let orders: Vec<Order> = open
            .into_iter()
            .chain(closed)
            .filter(|order| order.id.as_ref().map_or(true, |id| seen.insert(id.clone())))
            .collect();
        Ok(filter_by_since_limit(orders, since, limit, |o| o.timestamp))
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self
            .rest
            .get_open_orders(market.map(|m| m.id.as_str()), limit)
            .await?;
        let orders = self.parse_orders(&response, market)?;
        Ok(filter_by_since_limit(orders, since, limit, |o| o.timestamp))
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self
            .rest
            .get_history_orders(market.map(|m| m.id.as_str()), since, limit)
            .await?;
        let orders = self.parse_orders(&response, market)?;
        Ok(filter_by_since_limit(orders, since, limit, |o| o.timestamp))
    }

    async fn fetch_canceled_orders(
        &self,
        _symbol: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_canceled_orders"))
    }

    async fn cancel_all_orders(&self, _symbol: Option<&str>) -> Result<Vec<String>, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "cancel_all_orders"))
    }

    /// Spot fills are listed per symbol only.
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let symbol = symbol.ok_or_else(|| {
            ExchangeError::arguments_required(EXCHANGE_ID, "fetch_my_trades requires a symbol")
        })?;
        let market = self.market(symbol)?;
        let response = self.rest.get_my_trades(&market.id, since, limit).await?;
        let normalizer = self.normalizer();
        let trades: Vec<Trade> = as_list(EXCHANGE_ID, &response)?
            .iter()
            .map(|raw| parse_trade(&normalizer, raw, Some(market)))
            .collect();
        Ok(filter_by_since_limit(trades, since, limit, |t| t.timestamp))
    }
}
