use crate::core::normalize::{
    build_market, min_max, reconcile_balance, BalanceFields, LevelFields, LevelKey, Normalizer,
    OrderFields, SymbolSplit, TickerFields, TradeFields, TransactionFields,
};
use crate::core::precision::opt_mul;
use crate::core::safe::{get, get_any, get_string};
use crate::core::types::{
    Balance, Currency, Fee, Market, MarketLimits, MarketPrecision, OrderSide, Trade,
};
use rust_decimal::Decimal;
use serde_json::Value;

/// Market ids look like `LTC_BTC`.
pub const SPLIT: SymbolSplit = SymbolSplit::Delimited {
    separator: '_',
    base_first: true,
};

const PRECISION: MarketPrecision = MarketPrecision {
    amount: Some(8),
    price: Some(8),
};

pub const TICKER: TickerFields = TickerFields {
    market_id: &["market"],
    high: &["high"],
    low: &["low"],
    bid: &["bid"],
    ask: &["ask"],
    last: &["last"],
    percentage: &["change"],
    base_volume: &["baseVolume"],
    quote_volume: &["volume"],
    ..TickerFields::EMPTY
};

pub const TRADE: TradeFields = TradeFields {
    id: &["id", "Id"],
    market_id: &["Market"],
    timestamp: &["timeStamp", "Timestamp"],
    side: &["orderType", "Type"],
    price: &["price", "Rate"],
    amount: &["quantity", "Amount"],
    cost: &["total", "Total"],
    ..TradeFields::EMPTY
};

const ORDER_STATUS: &[(&str, &str)] = &[
    ("Open", "open"),
    ("Partial", "open"),
    ("Filled", "closed"),
    ("Closed", "closed"),
    ("Canceled", "canceled"),
];

/// `Type` carries the side on order records.
pub const ORDER: OrderFields = OrderFields {
    id: &["OrderId", "Id"],
    market_id: &["Market"],
    timestamp: &["Timestamp"],
    side: &["Side", "Type"],
    status: &["Status"],
    status_map: ORDER_STATUS,
    price: &["Price", "Rate"],
    amount: &["Amount"],
    remaining: &["Remaining"],
    ..OrderFields::EMPTY
};

pub const BOOK_LEVEL: LevelFields = LevelFields {
    price: LevelKey::Key("rate"),
    amount: LevelKey::Key("quantity"),
};

const BALANCE: BalanceFields = BalanceFields {
    currency: &["currency"],
    free: &["available"],
    used: &[],
    total: &["total"],
};

pub const TRANSACTION: TransactionFields = TransactionFields {
    id: &["Id"],
    txid: &["Txid"],
    timestamp: &["Timestamp"],
    currency: &["Currency"],
    amount: &["Amount"],
    address: &["Address"],
    tag: &["Tag", "PaymentId"],
    status: &["Status"],
    status_map: &[
        ("Confirmed", "ok"),
        ("Complete", "ok"),
        ("Unconfirmed", "pending"),
    ],
    fee_cost: &["Fee"],
    ..TransactionFields::EMPTY
};

/// Market from one `getmarketsummaries` entry.
pub fn parse_market(raw: &Value) -> Option<Market> {
    let id = get_string(raw, "market")?;
    let (base_id, quote_id) = SPLIT.split(&id)?;
    let active = get_string(raw, "marketStatus").map(|status| status == "OK");
    Some(build_market(
        id.clone(),
        base_id,
        quote_id,
        active,
        PRECISION,
        MarketLimits::default(),
        raw.clone(),
    ))
}

pub fn parse_currency(normalizer: &Normalizer<'_>, raw: &Value) -> Option<Currency> {
    let id = get_string(raw, "currency")?;
    Some(Currency {
        code: normalizer.currency_code(&id),
        id,
        name: get_string(raw, "currencyLong"),
        active: get_string(raw, "status").map(|status| status == "OK"),
        fee: get(raw, "txFee"),
        precision: Some(8),
        limits: MarketLimits {
            amount: min_max(get(raw, "minBaseTrade"), None),
            ..MarketLimits::default()
        },
        info: raw.clone(),
    })
}

/// Trade from market or account history.
///
/// `Fee` is a rate: buys pay it on the amount in the base currency, sells
/// on the cost in the quote currency.
pub fn parse_trade(normalizer: &Normalizer<'_>, raw: &Value, hint: Option<&Market>) -> Trade {
    let mut trade = normalizer.parse_trade(raw, hint, &TRADE);
    let Some(rate) = get::<Decimal, _>(raw, "Fee") else {
        return trade;
    };
    let (base, quote) = match hint {
        Some(market) => (Some(market.base.clone()), Some(market.quote.clone())),
        None => get_string(raw, "Market")
            .and_then(|id| {
                SPLIT.split(&id).map(|(base, quote)| {
                    (normalizer.currency_code(base), normalizer.currency_code(quote))
                })
            })
            .map_or((None, None), |(base, quote)| (Some(base), Some(quote))),
    };
    trade.fee = match trade.side {
        Some(OrderSide::Buy) => Some(Fee {
            cost: opt_mul(trade.amount, Some(rate)),
            currency: base,
            rate: Some(rate),
        }),
        Some(OrderSide::Sell) => Some(Fee {
            cost: opt_mul(trade.cost, Some(rate)),
            currency: quote,
            rate: Some(rate),
        }),
        None => None,
    };
    trade
}

/// Balance entry; `used` is everything held for trades, withdrawals and
/// unconfirmed deposits, derived from `total - available` when none is
/// reported.
pub fn parse_balance(normalizer: &Normalizer<'_>, raw: &Value) -> Option<(String, Balance)> {
    let (code, mut balance) = normalizer.parse_balance_entry(raw, &BALANCE)?;
    let held: Option<Decimal> = ["heldForTrades", "pendingWithdraw", "unconfirmed"]
        .iter()
        .map(|key| get::<Decimal, _>(raw, *key))
        .fold(None, |sum: Option<Decimal>, part| match part {
            Some(part) => Some(sum.unwrap_or_default() + part),
            None => sum,
        });
    if held.is_some() {
        balance = reconcile_balance(
            get_any(raw, BALANCE.free),
            held,
            get_any(raw, BALANCE.total),
        );
    }
    Some((code, balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markets::MarketCache;
    use crate::core::types::{OrderSide, OrderStatus, TransactionStatus, TransactionType};
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_market() {
        let market = parse_market(&json!({"market": "LTC_BTC", "marketStatus": "OK"})).unwrap();
        assert_eq!(market.id, "LTC_BTC");
        assert_eq!(market.symbol, "LTC/BTC");
        assert_eq!(market.active, Some(true));
        assert_eq!(market.precision.amount, Some(8));
        assert!(parse_market(&json!({"market": "NOPE"})).is_none());
    }

    #[test]
    fn test_balance_total_minus_available() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("tradesatoshi", &cache, SPLIT);
        let (code, balance) =
            parse_balance(&normalizer, &json!({"currency": "BTC", "available": "5", "total": "8"}))
                .unwrap();
        assert_eq!(code, "BTC");
        assert_eq!(balance.free, Some(dec("5")));
        assert_eq!(balance.used, Some(dec("3")));
        assert_eq!(balance.total, Some(dec("8")));
    }

    #[test]
    fn test_balance_sums_held_amounts() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("tradesatoshi", &cache, SPLIT);
        let raw = json!({
            "currency": "LTC",
            "available": 1.5,
            "heldForTrades": 0.25,
            "pendingWithdraw": 0,
            "unconfirmed": null,
        });
        let (_, balance) = parse_balance(&normalizer, &raw).unwrap();
        assert_eq!(balance.used, Some(dec("0.25")));
        assert_eq!(balance.total, Some(dec("1.75")));
    }

    #[test]
    fn test_parse_order_record() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("tradesatoshi", &cache, SPLIT);
        let raw = json!({
            "Id": "18253",
            "Market": "LTC_BTC",
            "Type": "Buy",
            "Amount": 100,
            "Rate": 0.01,
            "Remaining": 0.5,
            "Total": 1,
            "Status": "Partial",
            "Timestamp": "2015-12-07T20:04:05.3947572",
        });
        let order = normalizer.parse_order(&raw, None, &ORDER);
        assert_eq!(order.id.as_deref(), Some("18253"));
        assert_eq!(order.symbol.as_deref(), Some("LTC/BTC"));
        assert_eq!(order.side, Some(OrderSide::Buy));
        assert_eq!(order.status, Some(OrderStatus::Open));
        assert_eq!(order.filled, Some(dec("99.5")));
        assert_eq!(order.remaining, Some(dec("0.5")));
        assert_eq!(order.cost, Some(dec("0.995")));
        assert_eq!(order.timestamp, Some(1_449_518_645_394));
    }

    #[test]
    fn test_parse_trade_from_history() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("tradesatoshi", &cache, SPLIT);
        let raw = json!({
            "id": 502,
            "timeStamp": "2016-04-23T08:16:34.91",
            "quantity": 0.0065,
            "price": 0.079,
            "orderType": "Buy",
            "total": 0.0005135,
        });
        let trade = parse_trade(&normalizer, &raw, None);
        assert_eq!(trade.id.as_deref(), Some("502"));
        assert_eq!(trade.side, Some(OrderSide::Buy));
        assert_eq!(trade.cost, Some(dec("0.0005135")));
        assert_eq!(trade.symbol, None);
        assert_eq!(trade.fee, None);
    }

    #[test]
    fn test_account_trade_fee_rate() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("tradesatoshi", &cache, SPLIT);
        let buy = json!({
            "Id": "18253",
            "Market": "LTC_BTC",
            "Type": "Buy",
            "Amount": 100,
            "Rate": 0.01,
            "Fee": 0.002,
            "Total": 1,
            "Timestamp": "2015-12-07T20:04:05.3947572",
        });
        let trade = parse_trade(&normalizer, &buy, None);
        assert_eq!(trade.symbol.as_deref(), Some("LTC/BTC"));
        let fee = trade.fee.unwrap();
        assert_eq!(fee.cost, Some(dec("0.2")));
        assert_eq!(fee.currency.as_deref(), Some("LTC"));
        assert_eq!(fee.rate, Some(dec("0.002")));

        let mut sell = buy;
        sell["Type"] = json!("Sell");
        let fee = parse_trade(&normalizer, &sell, None).fee.unwrap();
        assert_eq!(fee.cost, Some(dec("0.002")));
        assert_eq!(fee.currency.as_deref(), Some("BTC"));
    }

    #[test]
    fn test_parse_withdrawal() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("tradesatoshi", &cache, SPLIT);
        let raw = json!({
            "Id": "436437",
            "Currency": "BTC",
            "Amount": 100,
            "Fee": 0.0004,
            "Address": "3KBUuGko4H5ke7EVsq9B7PLK1c5Askdd7y",
            "Status": "Complete",
            "Txid": "9281eacaad58335b884adc24be884c00200a4fc17b2e05c72e255976223de187",
            "Timestamp": "2015-12-07T20:04:05.3947572",
        });
        let tx = normalizer.parse_transaction(&raw, &TRANSACTION, Some(TransactionType::Withdrawal));
        assert_eq!(tx.status, Some(TransactionStatus::Ok));
        assert_eq!(tx.currency.as_deref(), Some("BTC"));
        assert_eq!(tx.fee.and_then(|f| f.cost), Some(dec("0.0004")));
        assert_eq!(tx.transaction_type, Some(TransactionType::Withdrawal));
    }
}
