use super::HbtcConnector;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{params, HttpClient};
use crate::core::normalize::{check_address, decimal_param, filter_by_since_limit};
use crate::core::safe::{as_list, get_string};
use crate::core::traits::AccountInfo;
use crate::core::types::{
    Balance, Balances, DepositAddress, TradingFee, Transaction, TransactionType, WithdrawReceipt,
};
use crate::exchanges::hbtc::{
    conversions::{parse_transaction, BALANCE},
    EXCHANGE_ID,
};
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

impl<T: HttpClient> HbtcConnector<T> {
    fn parse_transactions(
        &self,
        response: &Value,
        transaction_type: TransactionType,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        let normalizer = self.normalizer();
        let transactions: Vec<Transaction> = as_list(EXCHANGE_ID, response)?
            .iter()
            .map(|raw| parse_transaction(&normalizer, raw, transaction_type))
            .filter(|tx| code.map_or(true, |code| tx.currency.as_deref() == Some(code)))
            .collect();
        Ok(filter_by_since_limit(transactions, since, limit, |t| t.timestamp))
    }
}

#[async_trait]
impl<T: HttpClient> AccountInfo for HbtcConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        self.rest.client().require_credentials()?;
        let response = self.rest.get_account().await?;
        let normalizer = self.normalizer();
        let currencies: HashMap<String, Balance> = match response.get("balances") {
            Some(balances) => as_list(EXCHANGE_ID, balances)?
                .iter()
                .filter_map(|raw| normalizer.parse_balance_entry(raw, &BALANCE))
                .collect(),
            None => HashMap::new(),
        };
        Ok(Balances {
            currencies,
            timestamp: None,
            info: response,
        })
    }

    async fn fetch_trading_fee(&self, _symbol: &str) -> Result<TradingFee, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_trading_fee"))
    }

    async fn fetch_deposit_address(&self, _code: &str) -> Result<DepositAddress, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_deposit_address"))
    }

    /// The destination must already be whitelisted on the account.
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
        let client_order_id = rand::thread_rng().gen::<u64>().to_string();
        let mut request = params([
            ("clientOrderId", json!(client_order_id)),
            ("tokenId", json!(self.markets.currency_id(code))),
            ("address", json!(address)),
            ("withdrawQuantity", decimal_param(amount)),
        ]);
        if let Some(tag) = tag {
            request.insert("addressExt".to_string(), json!(tag));
        }
        let response = self.rest.post_withdraw(request).await?;
        Ok(WithdrawReceipt {
            id: get_string(&response, "orderId"),
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
        let response = self.rest.get_deposit_orders(since, limit).await?;
        self.parse_transactions(&response, TransactionType::Deposit, code, since, limit)
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let token = code.map(|c| self.markets.currency_id(c));
        let response = self
            .rest
            .get_withdrawal_orders(token.as_deref(), since, limit)
            .await?;
        self.parse_transactions(&response, TransactionType::Withdrawal, code, since, limit)
    }
}
