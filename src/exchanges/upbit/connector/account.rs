use super::UpbitConnector;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{params, HttpClient};
use crate::core::normalize::{check_address, decimal_param, filter_by_since_limit};
use crate::core::safe::{as_list, get_string};
use crate::core::traits::{AccountInfo, ExchangeConnector};
use crate::core::types::{
    Balance, Balances, DepositAddress, TradingFee, Transaction, WithdrawReceipt,
};
use crate::exchanges::upbit::{
    conversions::{parse_trading_fee, parse_transaction, BALANCE},
    EXCHANGE_ID,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

/// Fiat withdrawals go through their own endpoint.
const FIAT_CURRENCY: &str = "KRW";

impl<T: HttpClient> UpbitConnector<T> {
    fn parse_transactions(
        &self,
        response: &Value,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        let normalizer = self.normalizer();
        let transactions: Vec<Transaction> = as_list(EXCHANGE_ID, response)?
            .iter()
            .map(|raw| parse_transaction(&normalizer, raw))
            .collect();
        Ok(filter_by_since_limit(transactions, since, limit, |t| t.timestamp))
    }
}

#[async_trait]
impl<T: HttpClient> AccountInfo for UpbitConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        self.rest.client().require_credentials()?;
        let response = self.rest.get_accounts().await?;
        let normalizer = self.normalizer();
        let currencies: HashMap<String, Balance> = as_list(EXCHANGE_ID, &response)?
            .iter()
            .filter_map(|raw| normalizer.parse_balance_entry(raw, &BALANCE))
            .collect();
        Ok(Balances {
            currencies,
            timestamp: None,
            info: response,
        })
    }

    async fn fetch_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError> {
        self.rest.client().require_credentials()?;
        let currency_id = self.markets.currency_id(code);
        let response = self.rest.get_coin_address(&currency_id).await?;
        let address = get_string(&response, "deposit_address");
        let address = check_address(EXCHANGE_ID, address.as_deref())?;
        Ok(DepositAddress {
            currency: get_string(&response, "currency")
                .map_or_else(|| code.to_string(), |id| self.normalizer().currency_code(&id)),
            address,
            tag: get_string(&response, "secondary_address"),
            info: response,
        })
    }

    #[instrument(skip(self, address, tag), fields(exchange = EXCHANGE_ID))]
    async fn withdraw(
        &self,
        code: &str,
        amount: Decimal,
        address: &str,
        tag: Option<&str>,
    ) -> Result<WithdrawReceipt, ExchangeError> {
        self.rest.client().require_credentials()?;
        let address = check_address(EXCHANGE_ID, Some(address))?;
        let currency_id = self.markets.currency_id(code);
        let response = if currency_id == FIAT_CURRENCY {
            self.rest
                .post_withdraw_krw(params([("amount", decimal_param(amount))]))
                .await?
        } else {
            let mut request = params([
                ("currency", json!(currency_id)),
                ("amount", decimal_param(amount)),
                ("address", json!(address)),
            ]);
            if let Some(tag) = tag {
                request.insert("secondary_address".to_string(), json!(tag));
            }
            self.rest.post_withdraw_coin(request).await?
        };
        Ok(WithdrawReceipt {
            id: get_string(&response, "uuid"),
            info: response,
        })
    }

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let currency_id = code.map(|c| self.markets.currency_id(c));
        let response = self.rest.get_deposits(currency_id.as_deref(), limit).await?;
        self.parse_transactions(&response, since, limit)
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let currency_id = code.map(|c| self.markets.currency_id(c));
        let response = self.rest.get_withdraws(currency_id.as_deref(), limit).await?;
        self.parse_transactions(&response, since, limit)
    }

    /// Maker and taker rates from `orders/chance`, the larger of the bid and
    /// ask side for each.
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_trading_fee(&self, symbol: &str) -> Result<TradingFee, ExchangeError> {
        self.rest.client().require_credentials()?;
        let market = self.market(symbol)?;
        let response = self.rest.get_orders_chance(&market.id).await?;
        Ok(parse_trading_fee(&response, &market.symbol))
    }
}
