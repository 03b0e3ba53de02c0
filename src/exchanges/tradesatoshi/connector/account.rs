use super::TradeSatoshiConnector;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{params, HttpClient};
use crate::core::normalize::{check_address, decimal_param, filter_by_since_limit};
use crate::core::safe::{as_list, get_any, get_string};
use crate::core::traits::AccountInfo;
use crate::core::types::{
    Balances, DepositAddress, TradingFee, Transaction, TransactionType, WithdrawReceipt,
};
use crate::exchanges::tradesatoshi::{
    conversions::{parse_balance, TRANSACTION},
    rest::result_of,
    EXCHANGE_ID,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::instrument;

impl<T: HttpClient> TradeSatoshiConnector<T> {
    fn parse_transactions(
        &self,
        response: &Value,
        transaction_type: TransactionType,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        let normalizer = self.normalizer();
        let transactions: Vec<Transaction> = as_list(EXCHANGE_ID, result_of(response))?
            .iter()
            .map(|raw| normalizer.parse_transaction(raw, &TRANSACTION, Some(transaction_type)))
            .collect();
        Ok(filter_by_since_limit(transactions, since, limit, |t| t.timestamp))
    }
}

#[async_trait]
impl<T: HttpClient> AccountInfo for TradeSatoshiConnector<T> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_ID))]
    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        self.rest.client().require_credentials()?;
        let response = self.rest.get_balances().await?;
        let normalizer = self.normalizer();
        let currencies = as_list(EXCHANGE_ID, result_of(&response))?
            .iter()
            .filter_map(|raw| parse_balance(&normalizer, raw))
            .collect();
        Ok(Balances {
            currencies,
            timestamp: None,
            info: response,
        })
    }

    /// TradeSatoshi generates a fresh address on every request.
    async fn fetch_deposit_address(&self, code: &str) -> Result<DepositAddress, ExchangeError> {
        self.rest.client().require_credentials()?;
        let currency_id = self.markets.currency_id(code);
        let response = self.rest.generate_address(&currency_id).await?;
        let result = result_of(&response);
        let address = get_any::<String>(result, &["Address", "address"]);
        let address = check_address(EXCHANGE_ID, address.as_deref())?;
        Ok(DepositAddress {
            currency: code.to_string(),
            address,
            tag: get_any(result, &["PaymentId", "tag"]),
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
        let mut request = params([
            ("Currency", json!(self.markets.currency_id(code))),
            ("Address", json!(address)),
            ("Amount", decimal_param(amount)),
        ]);
        if let Some(tag) = tag {
            request.insert("PaymentId".to_string(), json!(tag));
        }
        let response = self.rest.submit_withdraw(request).await?;
        Ok(WithdrawReceipt {
            id: get_string(result_of(&response), "WithdrawalId"),
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
        self.parse_transactions(&response, TransactionType::Deposit, since, limit)
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        self.rest.client().require_credentials()?;
        let currency_id = code.map(|c| self.markets.currency_id(c));
        let response = self
            .rest
            .get_withdrawals(currency_id.as_deref(), limit)
            .await?;
        self.parse_transactions(&response, TransactionType::Withdrawal, since, limit)
    }

    async fn fetch_trading_fee(&self, _symbol: &str) -> Result<TradingFee, ExchangeError> {
        Err(ExchangeError::not_supported(EXCHANGE_ID, "fetch_trading_fee"))
    }
}
