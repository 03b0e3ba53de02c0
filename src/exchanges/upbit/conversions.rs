use crate::core::errors::ExchangeError;
use crate::core::normalize::{
    build_market, complete_order, BalanceFields, LevelFields, LevelKey, Normalizer, OrderFields,
    SymbolSplit, TickerFields, TradeFields, TransactionFields,
};
use crate::core::safe::{get, get_any, get_string, get_timestamp, iso8601, parse8601};
use crate::core::types::{
    Fee, Market, MarketLimits, MarketPrecision, Ohlcv, Order, OrderBook, OrderType, Trade,
    TradingFee, Transaction,
};
use rust_decimal::Decimal;
use serde_json::Value;

/// Market ids put the quote first: `KRW-BTC` is BTC/KRW.
pub const SPLIT: SymbolSplit = SymbolSplit::Delimited {
    separator: '-',
    base_first: false,
};

/// Upbit publishes no per-market precision.
const PRECISION_PLACES: u32 = 8;

pub const TICKER: TickerFields = TickerFields {
    market_id: &["market", "code"],
    timestamp: &["trade_timestamp"],
    high: &["high_price"],
    low: &["low_price"],
    open: &["opening_price"],
    last: &["trade_price"],
    previous_close: &["prev_closing_price"],
    change: &["signed_change_price"],
    percentage: &["signed_change_rate"],
    base_volume: &["acc_trade_volume_24h"],
    quote_volume: &["acc_trade_price_24h"],
    ..TickerFields::EMPTY
};

const TRADE: TradeFields = TradeFields {
    id: &["sequential_id", "uuid"],
    market_id: &["market", "code"],
    timestamp: &["timestamp", "created_at"],
    side: &["ask_bid", "side"],
    side_map: &[("ask", "sell"), ("bid", "buy")],
    price: &["trade_price", "price"],
    amount: &["trade_volume", "volume"],
    cost: &["funds"],
    ..TradeFields::EMPTY
};

const ORDER: OrderFields = OrderFields {
    id: &["uuid"],
    market_id: &["market"],
    timestamp: &["created_at"],
    order_type: &["ord_type"],
    type_map: &[("limit", "limit"), ("price", "market"), ("market", "market")],
    side: &["side"],
    side_map: &[("bid", "buy"), ("ask", "sell")],
    status: &["state"],
    status_map: &[("wait", "open"), ("done", "closed"), ("cancel", "canceled")],
    price: &["price"],
    amount: &["volume"],
    filled: &["executed_volume"],
    remaining: &["remaining_volume"],
    fee_cost: &["paid_fee"],
    ..OrderFields::EMPTY
};

const BID_LEVEL: LevelFields = LevelFields {
    price: LevelKey::Key("bid_price"),
    amount: LevelKey::Key("bid_size"),
};

const ASK_LEVEL: LevelFields = LevelFields {
    price: LevelKey::Key("ask_price"),
    amount: LevelKey::Key("ask_size"),
};

pub const BALANCE: BalanceFields = BalanceFields {
    currency: &["currency"],
    free: &["balance"],
    used: &["locked"],
    total: &[],
};

const TRANSACTION: TransactionFields = TransactionFields {
    id: &["uuid"],
    txid: &["txid"],
    timestamp: &["created_at"],
    updated: &["done_at"],
    currency: &["currency"],
    amount: &["amount"],
    status: &["state"],
    status_map: &[
        ("submitting", "pending"),
        ("submitted", "pending"),
        ("almost_accepted", "pending"),
        ("accepted", "pending"),
        ("processing", "pending"),
        ("rejected", "failed"),
        ("done", "ok"),
        ("canceled", "canceled"),
    ],
    transaction_type: &["type"],
    type_map: &[("withdraw", "withdrawal"), ("deposit", "deposit")],
    fee_cost: &["fee"],
    ..TransactionFields::EMPTY
};

/// One `market/all` entry.
pub fn parse_market(raw: &Value) -> Option<Market> {
    let id = get_string(raw, "market")?;
    let (base_id, quote_id) = SPLIT.split(&id)?;
    let (base_id, quote_id) = (base_id.to_string(), quote_id.to_string());
    let precision = MarketPrecision {
        amount: Some(PRECISION_PLACES),
        price: Some(PRECISION_PLACES),
    };
    Some(build_market(
        id,
        &base_id,
        &quote_id,
        Some(true),
        precision,
        MarketLimits::default(),
        raw.clone(),
    ))
}

/// Quote currency of the market a record belongs to.
fn quote_currency(normalizer: &Normalizer<'_>, raw: &Value, hint: Option<&Market>) -> Option<String> {
    if let Some(market) = hint {
        return Some(market.quote.clone());
    }
    let market_id = get_any::<String>(raw, &["market", "code"])?;
    match normalizer.market_by_id(&market_id) {
        Some(market) => Some(market.quote.clone()),
        None => SPLIT
            .split(&market_id)
            .map(|(_, quote)| normalizer.currency_code(quote)),
    }
}

/// Public tick or order fill. Fills carry their fee as `bid_fee` or
/// `ask_fee`, in the quote currency.
pub fn parse_trade(normalizer: &Normalizer<'_>, raw: &Value, hint: Option<&Market>) -> Trade {
    let mut trade = normalizer.parse_trade(raw, hint, &TRADE);
    let fee_key = get_any::<String>(raw, &["ask_bid", "side"])
        .map(|side| format!("{}_fee", side.to_lowercase()));
    if let Some(cost) = fee_key.and_then(|key| get::<Decimal, _>(raw, key.as_str())) {
        trade.fee = Some(Fee {
            cost: Some(cost),
            currency: quote_currency(normalizer, raw, hint),
            rate: None,
        });
    }
    trade
}

/// Order record.
///
/// A market buy (`ord_type` `price`) states its size in quote currency: the
/// vendor `price` is its cost and the order has no price. When fills are
/// attached, cost and average come from them.
pub fn parse_order(normalizer: &Normalizer<'_>, raw: &Value, hint: Option<&Market>) -> Order {
    let mut order = normalizer.parse_order(raw, hint, &ORDER);
    let quote = quote_currency(normalizer, raw, hint);
    if let Some(fee) = order.fee.as_mut() {
        fee.currency = quote.clone();
    }

    let mut recompute = false;
    if get_string(raw, "ord_type").as_deref() == Some("price") {
        order.cost = order.price.take();
        order.average = None;
        recompute = true;
    }

    let trades: Vec<Trade> = raw
        .get("trades")
        .and_then(Value::as_array)
        .map(|fills| {
            fills
                .iter()
                .map(|fill| parse_trade(normalizer, fill, hint))
                .collect()
        })
        .unwrap_or_default();
    if !trades.is_empty() {
        order.cost = trades
            .iter()
            .filter_map(|t| t.cost)
            .try_fold(Decimal::ZERO, |sum, cost| sum.checked_add(cost));
        order.average = None;
        order.last_trade_timestamp = trades.last().and_then(|t| t.timestamp);
        if order.fee.is_none() {
            let fee_cost = trades
                .iter()
                .filter_map(|t| t.fee.as_ref().and_then(|f| f.cost))
                .try_fold(Decimal::ZERO, |sum, cost| sum.checked_add(cost));
            order.fee = fee_cost.map(|cost| Fee {
                cost: Some(cost),
                currency: quote,
                rate: None,
            });
        }
        recompute = true;
    }
    if recompute {
        complete_order(&mut order);
    }
    order.trades = trades;
    order
}

/// One `orderbook` entry; each unit holds one level of both sides.
pub fn parse_order_book(
    normalizer: &Normalizer<'_>,
    raw: &Value,
    hint: Option<&Market>,
) -> Result<OrderBook, ExchangeError> {
    let units = raw.get("orderbook_units").unwrap_or(&Value::Null);
    let market_id = get_string(raw, "market");
    let timestamp = get_timestamp(raw, &["timestamp"]);
    Ok(OrderBook {
        symbol: normalizer.resolve_symbol(market_id.as_deref(), hint),
        bids: normalizer.parse_levels(units, &BID_LEVEL, true)?,
        asks: normalizer.parse_levels(units, &ASK_LEVEL, false)?,
        timestamp,
        datetime: timestamp.and_then(iso8601),
        nonce: None,
    })
}

/// Deposit or withdrawal. The record time falls back to completion time.
pub fn parse_transaction(normalizer: &Normalizer<'_>, raw: &Value) -> Transaction {
    let mut transaction = normalizer.parse_transaction(raw, &TRANSACTION, None);
    if transaction.timestamp.is_none() {
        transaction.timestamp = transaction.updated;
        transaction.datetime = transaction.timestamp.and_then(iso8601);
    }
    transaction
}

/// Candle route for a unified timeframe, plus the minute unit when the
/// route is `minutes`.
pub fn candle_route(timeframe: &str) -> Option<(&'static str, Option<u32>)> {
    let route = match timeframe {
        "1m" => ("minutes", Some(1)),
        "3m" => ("minutes", Some(3)),
        "5m" => ("minutes", Some(5)),
        "15m" => ("minutes", Some(15)),
        "30m" => ("minutes", Some(30)),
        "1h" => ("minutes", Some(60)),
        "4h" => ("minutes", Some(240)),
        "1d" => ("days", None),
        "1w" => ("weeks", None),
        "1M" => ("months", None),
        _ => return None,
    };
    Some(route)
}

/// Candle keyed by its UTC open time; volume is in the base currency.
pub fn parse_ohlcv(raw: &Value) -> Option<Ohlcv> {
    let timestamp = get_string(raw, "candle_date_time_utc").and_then(|s| parse8601(&s))?;
    Some(Ohlcv {
        timestamp,
        open: get(raw, "opening_price"),
        high: get(raw, "high_price"),
        low: get(raw, "low_price"),
        close: get(raw, "trade_price"),
        volume: get(raw, "candle_acc_trade_volume"),
    })
}

/// `orders/chance` fees: the larger of the bid and ask rate for each role.
pub fn parse_trading_fee(raw: &Value, symbol: &str) -> TradingFee {
    let larger = |a: &str, b: &str| match (get::<Decimal, _>(raw, a), get::<Decimal, _>(raw, b)) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    TradingFee {
        symbol: symbol.to_string(),
        maker: larger("maker_ask_fee", "maker_bid_fee"),
        taker: larger("ask_fee", "bid_fee"),
        info: raw.clone(),
    }
}

/// Order type name on the wire for a unified order.
pub fn order_type_name(order_type: &OrderType, is_buy: bool) -> &'static str {
    match (order_type, is_buy) {
        (OrderType::Market, true) => "price",
        (OrderType::Market, false) => "market",
        _ => "limit",
    }
}
