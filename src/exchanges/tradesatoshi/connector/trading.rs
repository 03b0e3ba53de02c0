use super::TradeSatoshiConnector;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::{params, HttpClient};
use crate::core::normalize::{
    amount_to_precision, complete_order, decimal_param, filter_by_since_limit, price_to_precision,
};
use crate::core::safe::{as_list, get_string, Extract};
use crate::core::traits::{ExchangeConnector, OrderPlacer};
use crate::core::types::{Order, OrderRequest, OrderSide, OrderStatus, OrderType, Trade};
use crate::exchanges::tradesatoshi::{
    conversions::{parse_trade, ORDER},
    rest::result_of,
    EXCHANGE_ID,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

fn side_name(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "Buy",
        OrderSide::Sell => "Sell",
    }
}

fn with_status(orders: Vec<Order>, status: &OrderStatus) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|order| order.status.as_ref() == Some(status))
        .collect()
}

#[async_trait]
impl<T: HttpClient> OrderPlacer for TradeSatoshiConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn create_order(&self, order: OrderRequest) -> Result<Order, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = self.market(&order.symbol)?;

        let mut request = params([
            ("Market", json!(market.id)),
            ("Type", json!(side_name(order.side))),
            ("Amount", decimal_param(amount_to_precision(market, order.amount))),
        ]);
        let is_market = match &order.order_type {
            OrderType::Limit => {
                let price = order.price.ok_or_else(|| {
                    ExchangeError::arguments_required(EXCHANGE_ID, "limit orders require a price")
                })?;
                request.insert(
                    "Price".to_string(),
                    decimal_param(price_to_precision(market, price)),
                );
                false
            }
            OrderType::Market => true,
            OrderType::Other(other) => {
                return Err(ExchangeError::new(
                    ErrorKind::InvalidOrder,
                    EXCHANGE_ID,
                    format!("{} allows market and limit orders only, got {}", EXCHANGE_ID, other),
                ));
            }
        };

        let response = self.rest.submit_order(is_market, request).await?;
        let mut created = Order {
            id: get_string(result_of(&response), "OrderId"),
            symbol: Some(market.symbol.clone()),
            order_type: Some(order.order_type),
            side: Some(order.side),
            price: order.price,
            amount: Some(order.amount),
            status: Some(OrderStatus::Open),
            info: response,
            ..Order::default()
        };
        complete_order(&mut created);
        Ok(created)
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> Result<Order, ExchangeError> {
        self.rest.client().require_credentials()?;
        let response = self.rest.cancel_order(id).await?;
        Ok(Order {
            id: Some(id.to_string()),
            symbol: symbol.map(str::to_string),
            status: Some(OrderStatus::Canceled),
            info: response,
            ..Order::default()
        })
    }

    async fn fetch_order(&self, id: &str, _symbol: Option<&str>) -> Result<Order, ExchangeError> {
        self.rest.client().require_credentials()?;
        let response = self.rest.get_order(id).await?;
        let result = result_of(&response);
        if result.is_null() {
            return Err(ExchangeError::new(
                ErrorKind::OrderNotFound,
                EXCHANGE_ID,
                format!("{} order {} not found", EXCHANGE_ID, id),
            ));
        }
        Ok(self.normalizer().parse_order(result, None, &ORDER))
    }

    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self
            .rest
            .get_orders(market.map(|m| m.id.as_str()), limit)
            .await?;
        let normalizer = self.normalizer();
        let orders: Vec<Order> = as_list(EXCHANGE_ID, result_of(&response))?
            .iter()
            .map(|raw| normalizer.parse_order(raw, market, &ORDER))
            .collect();
        Ok(filter_by_since_limit(orders, since, limit, |o| o.timestamp))
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let orders = self.fetch_orders(symbol, since, limit).await?;
        Ok(with_status(orders, &OrderStatus::Open))
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let orders = self.fetch_orders(symbol, since, limit).await?;
        Ok(with_status(orders, &OrderStatus::Closed))
    }

    async fn fetch_canceled_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let orders = self.fetch_orders(symbol, since, limit).await?;
        Ok(with_status(orders, &OrderStatus::Canceled))
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<Vec<String>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self
            .rest
            .cancel_orders(market.map(|m| m.id.as_str()))
            .await?;
        let Some(canceled) = result_of(&response).get("CanceledOrders") else {
            return Ok(Vec::new());
        };
        Ok(as_list(EXCHANGE_ID, canceled)?
            .iter()
            .filter_map(String::extract)
            .collect())
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let response = self
            .rest
            .get_trade_history(market.map(|m| m.id.as_str()), limit)
            .await?;
        let normalizer = self.normalizer();
        let trades: Vec<Trade> = as_list(EXCHANGE_ID, result_of(&response))?
            .iter()
            .map(|raw| parse_trade(&normalizer, raw, market))
            .collect();
        Ok(filter_by_since_limit(trades, since, limit, |t| t.timestamp))
    }
}
