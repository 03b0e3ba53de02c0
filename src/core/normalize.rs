//! Field-map driven conversion of vendor records into canonical records.
//!
//! A connector describes its payloads with the `*Fields` tables below (which
//! keys hold which field, plus raw-to-canonical enum maps) and gets the
//! shared derivations for free: symbol resolution, cost and remaining
//! amounts, balance reconciliation and order book ordering.

use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::markets::MarketCache;
use crate::core::precision::{
    opt_add, opt_mul, opt_sub, round_to_places, scale_of, truncate_to_places, vwap,
};
use crate::core::safe::{self, as_list, get, get_any, get_timestamp, iso8601};
use crate::core::types::{
    Balance, Fee, Market, MarketLimits, MarketPrecision, MinMax, Order, OrderBook, OrderSide,
    OrderStatus, OrderType, PriceLevel, TakerOrMaker, Ticker, Trade, Transaction,
    TransactionStatus, TransactionType,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

/// Candidate keys for one field, tried in order.
pub type Keys = &'static [&'static str];

/// Raw vendor value to canonical value; unmatched values pass through.
pub type ValueMap = &'static [(&'static str, &'static str)];

/// Translate a raw enum value through `table`, keeping it verbatim when unknown.
pub fn map_value(table: ValueMap, raw: &str) -> String {
    table
        .iter()
        .find(|(from, _)| *from == raw)
        .or_else(|| table.iter().find(|(from, _)| from.eq_ignore_ascii_case(raw)))
        .map_or_else(|| raw.to_string(), |(_, to)| (*to).to_string())
}

pub fn parse_side(raw: &str) -> Option<OrderSide> {
    match raw.to_ascii_lowercase().as_str() {
        "buy" => Some(OrderSide::Buy),
        "sell" => Some(OrderSide::Sell),
        _ => None,
    }
}

/// Vendor aliases for widely traded currencies.
pub fn common_currency_code(code: &str) -> String {
    match code {
        "XBT" => "BTC",
        "BCC" | "BCHABC" => "BCH",
        "DRK" => "DASH",
        "BCHSV" => "BSV",
        other => other,
    }
    .to_string()
}

/// How a vendor market id encodes its base and quote currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSplit {
    /// Concatenated ids such as `BTCUSDT`; cannot be split without the cache.
    Opaque,
    Delimited { separator: char, base_first: bool },
}

impl SymbolSplit {
    pub fn split<'a>(&self, market_id: &'a str) -> Option<(&'a str, &'a str)> {
        match *self {
            Self::Opaque => None,
            Self::Delimited {
                separator,
                base_first,
            } => {
                let (first, second) = market_id.split_once(separator)?;
                if first.is_empty() || second.is_empty() {
                    return None;
                }
                Some(if base_first {
                    (first, second)
                } else {
                    (second, first)
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TickerFields {
    pub market_id: Keys,
    pub timestamp: Keys,
    pub high: Keys,
    pub low: Keys,
    pub bid: Keys,
    pub bid_volume: Keys,
    pub ask: Keys,
    pub ask_volume: Keys,
    pub open: Keys,
    pub last: Keys,
    pub previous_close: Keys,
    pub change: Keys,
    pub percentage: Keys,
    pub base_volume: Keys,
    pub quote_volume: Keys,
    pub vwap: Keys,
}

impl TickerFields {
    pub const EMPTY: Self = Self {
        market_id: &[],
        timestamp: &[],
        high: &[],
        low: &[],
        bid: &[],
        bid_volume: &[],
        ask: &[],
        ask_volume: &[],
        open: &[],
        last: &[],
        previous_close: &[],
        change: &[],
        percentage: &[],
        base_volume: &[],
        quote_volume: &[],
        vwap: &[],
    };
}

#[derive(Debug, Clone, Copy)]
pub struct TradeFields {
    pub id: Keys,
    pub order_id: Keys,
    pub market_id: Keys,
    pub timestamp: Keys,
    pub side: Keys,
    pub side_map: ValueMap,
    pub order_type: Keys,
    pub price: Keys,
    pub amount: Keys,
    pub cost: Keys,
    pub fee_cost: Keys,
    pub fee_currency: Keys,
    pub taker_or_maker: Keys,
}

impl TradeFields {
    pub const EMPTY: Self = Self {
        id: &[],
        order_id: &[],
        market_id: &[],
        timestamp: &[],
        side: &[],
        side_map: &[],
        order_type: &[],
        price: &[],
        amount: &[],
        cost: &[],
        fee_cost: &[],
        fee_currency: &[],
        taker_or_maker: &[],
    };
}

#[derive(Debug, Clone, Copy)]
pub struct OrderFields {
    pub id: Keys,
    pub client_order_id: Keys,
    pub market_id: Keys,
    pub timestamp: Keys,
    pub last_trade_timestamp: Keys,
    pub order_type: Keys,
    pub type_map: ValueMap,
    pub side: Keys,
    pub side_map: ValueMap,
    pub status: Keys,
    pub status_map: ValueMap,
    pub price: Keys,
    pub amount: Keys,
    pub filled: Keys,
    pub remaining: Keys,
    pub cost: Keys,
    pub average: Keys,
    pub fee_cost: Keys,
    pub fee_currency: Keys,
}

impl OrderFields {
    pub const EMPTY: Self = Self {
        id: &[],
        client_order_id: &[],
        market_id: &[],
        timestamp: &[],
        last_trade_timestamp: &[],
        order_type: &[],
        type_map: &[],
        side: &[],
        side_map: &[],
        status: &[],
        status_map: &[],
        price: &[],
        amount: &[],
        filled: &[],
        remaining: &[],
        cost: &[],
        average: &[],
        fee_cost: &[],
        fee_currency: &[],
    };
}

#[derive(Debug, Clone, Copy)]
pub struct BalanceFields {
    pub currency: Keys,
    pub free: Keys,
    pub used: Keys,
    pub total: Keys,
}

#[derive(Debug, Clone, Copy)]
pub struct TransactionFields {
    pub id: Keys,
    pub txid: Keys,
    pub timestamp: Keys,
    pub updated: Keys,
    pub currency: Keys,
    pub amount: Keys,
    pub address: Keys,
    pub tag: Keys,
    pub status: Keys,
    pub status_map: ValueMap,
    pub transaction_type: Keys,
    pub type_map: ValueMap,
    pub fee_cost: Keys,
}

impl TransactionFields {
    pub const EMPTY: Self = Self {
        id: &[],
        txid: &[],
        timestamp: &[],
        updated: &[],
        currency: &[],
        amount: &[],
        address: &[],
        tag: &[],
        status: &[],
        status_map: &[],
        transaction_type: &[],
        type_map: &[],
        fee_cost: &[],
    };
}

/// Where to find price and amount inside one order book level.
#[derive(Debug, Clone, Copy)]
pub enum LevelKey {
    Index(usize),
    Key(&'static str),
}

impl LevelKey {
    fn decimal(self, level: &Value) -> Option<Decimal> {
        match self {
            Self::Index(i) => get(level, i),
            Self::Key(k) => get(level, k),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LevelFields {
    pub price: LevelKey,
    pub amount: LevelKey,
}

impl LevelFields {
    /// `[price, amount]` pairs.
    pub const PAIR: Self = Self {
        price: LevelKey::Index(0),
        amount: LevelKey::Index(1),
    };
}

/// Reconcile a balance so that `total = free + used` whenever two of the
/// three are known.
///
/// When all three are reported but disagree, the two reported with the most
/// decimal places are kept and the third is derived (ties prefer `free`,
/// then `total`).
pub fn reconcile_balance(
    free: Option<Decimal>,
    used: Option<Decimal>,
    total: Option<Decimal>,
) -> Balance {
    match (free, used, total) {
        (Some(f), Some(u), None) => Balance {
            free,
            used,
            total: f.checked_add(u),
        },
        (Some(f), None, Some(t)) => Balance {
            free,
            used: t.checked_sub(f),
            total,
        },
        (None, Some(u), Some(t)) => Balance {
            free: t.checked_sub(u),
            used,
            total,
        },
        (Some(f), Some(u), Some(t)) if f.checked_add(u) != Some(t) => {
            // rank: more decimal places first, then free > total > used
            let mut ranked = [(scale_of(f), 2, 'f'), (scale_of(t), 1, 't'), (scale_of(u), 0, 'u')];
            ranked.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
            match ranked[2].2 {
                'f' => Balance {
                    free: t.checked_sub(u),
                    used,
                    total,
                },
                't' => Balance {
                    free,
                    used,
                    total: f.checked_add(u),
                },
                _ => Balance {
                    free,
                    used: t.checked_sub(f),
                    total,
                },
            }
        }
        _ => Balance { free, used, total },
    }
}

/// Fill the derivable order amounts.
///
/// `remaining` is always `max(0, amount - filled)` when both are known, so a
/// vendor overfill never yields a negative remainder.
pub fn complete_order(order: &mut Order) {
    let non_negative = |value: Decimal| value.max(Decimal::ZERO);
    if order.filled.is_none() {
        order.filled = opt_sub(order.amount, order.remaining).map(non_negative);
    }
    if order.amount.is_none() {
        order.amount = opt_add(order.filled, order.remaining);
    }
    if let Some(remaining) = opt_sub(order.amount, order.filled) {
        order.remaining = Some(non_negative(remaining));
    }
    if order.cost.is_none() {
        order.cost = opt_mul(order.filled, order.average.or(order.price));
    }
    if order.average.is_none() {
        if let (Some(cost), Some(filled)) = (order.cost, order.filled) {
            if !filled.is_zero() {
                order.average = cost.checked_div(filled);
            }
        }
    }
}

/// Sort and de-duplicate one side of a book; later entries win on equal price.
pub fn sort_levels(levels: Vec<PriceLevel>, descending: bool) -> Vec<PriceLevel> {
    let merged: BTreeMap<Decimal, Decimal> = levels
        .into_iter()
        .map(|level| (level.price, level.amount))
        .collect();
    let iter = merged
        .into_iter()
        .map(|(price, amount)| PriceLevel { price, amount });
    if descending {
        iter.rev().collect()
    } else {
        iter.collect()
    }
}

/// Build a [`Market`] from vendor currency ids.
pub fn build_market(
    id: impl Into<String>,
    base_id: &str,
    quote_id: &str,
    active: Option<bool>,
    precision: MarketPrecision,
    mut limits: MarketLimits,
    info: Value,
) -> Market {
    let base = common_currency_code(&base_id.to_uppercase());
    let quote = common_currency_code(&quote_id.to_uppercase());
    if limits.cost.min.is_none() {
        limits.cost.min = opt_mul(limits.amount.min, limits.price.min);
    }
    Market {
        id: id.into(),
        symbol: format!("{}/{}", base, quote),
        base,
        quote,
        base_id: base_id.to_string(),
        quote_id: quote_id.to_string(),
        active,
        precision,
        limits,
        info,
    }
}

pub fn min_max(min: Option<Decimal>, max: Option<Decimal>) -> MinMax {
    MinMax { min, max }
}

/// Parsers bound to one connector's market cache.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    exchange: &'a str,
    markets: &'a MarketCache,
    split: SymbolSplit,
}

impl<'a> Normalizer<'a> {
    pub const fn new(exchange: &'a str, markets: &'a MarketCache, split: SymbolSplit) -> Self {
        Self {
            exchange,
            markets,
            split,
        }
    }

    pub const fn exchange(&self) -> &'a str {
        self.exchange
    }

    /// Unified currency code for a vendor currency id.
    pub fn currency_code(&self, currency_id: &str) -> String {
        self.markets
            .code_for_currency_id(currency_id)
            .unwrap_or_else(|| common_currency_code(&currency_id.to_uppercase()))
    }

    pub fn market_by_id(&self, market_id: &str) -> Option<&'a Market> {
        self.markets.by_id(market_id)
    }

    /// Resolve a symbol: explicit hint, then cached market, then a symbol
    /// synthesized from the id, else `None`.
    pub fn resolve_symbol(&self, market_id: Option<&str>, hint: Option<&Market>) -> Option<String> {
        if let Some(market) = hint {
            return Some(market.symbol.clone());
        }
        let market_id = market_id?;
        if let Some(market) = self.markets.by_id(market_id) {
            return Some(market.symbol.clone());
        }
        self.split.split(market_id).map(|(base, quote)| {
            format!("{}/{}", self.currency_code(base), self.currency_code(quote))
        })
    }

    fn symbol_of(&self, raw: &Value, keys: Keys, hint: Option<&Market>) -> Option<String> {
        let market_id: Option<String> = get_any(raw, keys);
        self.resolve_symbol(market_id.as_deref(), hint)
    }

    pub fn parse_ticker(&self, raw: &Value, hint: Option<&Market>, fields: &TickerFields) -> Ticker {
        let timestamp = get_timestamp(raw, fields.timestamp);
        let open: Option<Decimal> = get_any(raw, fields.open);
        let last: Option<Decimal> = get_any(raw, fields.last);
        let change = get_any(raw, fields.change).or_else(|| opt_sub(last, open));
        let percentage = get_any(raw, fields.percentage).or_else(|| match (change, open) {
            (Some(change), Some(open)) if !open.is_zero() => change
                .checked_div(open)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED)),
            _ => None,
        });
        let average = opt_add(open, last).and_then(|sum| sum.checked_div(Decimal::TWO));
        let base_volume = get_any(raw, fields.base_volume);
        let quote_volume = get_any(raw, fields.quote_volume);

        Ticker {
            symbol: self.symbol_of(raw, fields.market_id, hint),
            timestamp,
            datetime: timestamp.and_then(iso8601),
            high: get_any(raw, fields.high),
            low: get_any(raw, fields.low),
            bid: get_any(raw, fields.bid),
            bid_volume: get_any(raw, fields.bid_volume),
            ask: get_any(raw, fields.ask),
            ask_volume: get_any(raw, fields.ask_volume),
            vwap: get_any(raw, fields.vwap).or_else(|| vwap(base_volume, quote_volume)),
            open,
            close: last,
            last,
            previous_close: get_any(raw, fields.previous_close),
            change,
            percentage,
            average,
            base_volume,
            quote_volume,
            info: raw.clone(),
        }
    }

    pub fn parse_trade(&self, raw: &Value, hint: Option<&Market>, fields: &TradeFields) -> Trade {
        let timestamp = get_timestamp(raw, fields.timestamp);
        let price: Option<Decimal> = get_any(raw, fields.price);
        let amount: Option<Decimal> = get_any(raw, fields.amount);
        let fee_cost: Option<Decimal> = get_any(raw, fields.fee_cost);

        Trade {
            id: get_any(raw, fields.id),
            order: get_any(raw, fields.order_id),
            timestamp,
            datetime: timestamp.and_then(iso8601),
            symbol: self.symbol_of(raw, fields.market_id, hint),
            order_type: get_any::<String>(raw, fields.order_type)
                .map(|t| OrderType::from(t.to_lowercase())),
            side: get_any::<String>(raw, fields.side)
                .and_then(|s| parse_side(&map_value(fields.side_map, &s))),
            taker_or_maker: get_any::<String>(raw, fields.taker_or_maker).and_then(|t| {
                match t.to_lowercase().as_str() {
                    "taker" => Some(TakerOrMaker::Taker),
                    "maker" => Some(TakerOrMaker::Maker),
                    _ => None,
                }
            }),
            price,
            amount,
            cost: get_any(raw, fields.cost).or_else(|| opt_mul(price, amount)),
            fee: fee_cost.map(|cost| Fee {
                cost: Some(cost),
                currency: get_any::<String>(raw, fields.fee_currency)
                    .map(|c| self.currency_code(&c)),
                rate: None,
            }),
            info: raw.clone(),
        }
    }

    pub fn parse_order(&self, raw: &Value, hint: Option<&Market>, fields: &OrderFields) -> Order {
        let timestamp = get_timestamp(raw, fields.timestamp);
        let fee_cost: Option<Decimal> = get_any(raw, fields.fee_cost);
        let fee_currency = get_any::<String>(raw, fields.fee_currency)
            .map(|c| self.currency_code(&c))
            .or_else(|| hint.map(|m| m.quote.clone()));

        let mut order = Order {
            id: get_any(raw, fields.id),
            client_order_id: get_any(raw, fields.client_order_id),
            timestamp,
            datetime: timestamp.and_then(iso8601),
            last_trade_timestamp: get_timestamp(raw, fields.last_trade_timestamp),
            symbol: self.symbol_of(raw, fields.market_id, hint),
            order_type: get_any::<String>(raw, fields.order_type)
                .map(|t| OrderType::from(map_value(fields.type_map, &t))),
            side: get_any::<String>(raw, fields.side)
                .and_then(|s| parse_side(&map_value(fields.side_map, &s))),
            price: get_any(raw, fields.price),
            amount: get_any(raw, fields.amount),
            cost: get_any(raw, fields.cost),
            average: get_any(raw, fields.average),
            filled: get_any(raw, fields.filled),
            remaining: get_any(raw, fields.remaining),
            status: get_any::<String>(raw, fields.status)
                .map(|s| OrderStatus::from(map_value(fields.status_map, &s))),
            fee: fee_cost.map(|cost| Fee {
                cost: Some(cost),
                currency: fee_currency,
                rate: None,
            }),
            trades: Vec::new(),
            info: raw.clone(),
        };
        complete_order(&mut order);
        order
    }

    /// One side of a book from a list of levels; entries missing a price or
    /// amount are skipped.
    pub fn parse_levels(
        &self,
        raw: &Value,
        fields: &LevelFields,
        descending: bool,
    ) -> Result<Vec<PriceLevel>, ExchangeError> {
        if raw.is_null() {
            return Ok(Vec::new());
        }
        let levels = as_list(self.exchange, raw)?
            .iter()
            .filter_map(|level| {
                Some(PriceLevel {
                    price: fields.price.decimal(level)?,
                    amount: fields.amount.decimal(level)?,
                })
            })
            .collect();
        Ok(sort_levels(levels, descending))
    }

    pub fn parse_order_book(
        &self,
        bids: &Value,
        asks: &Value,
        fields: &LevelFields,
        symbol: Option<String>,
        timestamp: Option<i64>,
    ) -> Result<OrderBook, ExchangeError> {
        Ok(OrderBook {
            symbol,
            bids: self.parse_levels(bids, fields, true)?,
            asks: self.parse_levels(asks, fields, false)?,
            timestamp,
            datetime: timestamp.and_then(iso8601),
            nonce: None,
        })
    }

    /// Currency code and reconciled balance for one vendor balance entry.
    pub fn parse_balance_entry(&self, raw: &Value, fields: &BalanceFields) -> Option<(String, Balance)> {
        let currency_id: String = get_any(raw, fields.currency)?;
        let balance = reconcile_balance(
            get_any(raw, fields.free),
            get_any(raw, fields.used),
            get_any(raw, fields.total),
        );
        Some((self.currency_code(&currency_id), balance))
    }

    pub fn parse_transaction(
        &self,
        raw: &Value,
        fields: &TransactionFields,
        transaction_type: Option<TransactionType>,
    ) -> Transaction {
        let timestamp = get_timestamp(raw, fields.timestamp);
        let currency = get_any::<String>(raw, fields.currency).map(|c| self.currency_code(&c));
        let transaction_type = transaction_type.or_else(|| {
            get_any::<String>(raw, fields.transaction_type).and_then(|t| {
                match map_value(fields.type_map, &t).as_str() {
                    "deposit" => Some(TransactionType::Deposit),
                    "withdrawal" => Some(TransactionType::Withdrawal),
                    _ => None,
                }
            })
        });

        Transaction {
            id: get_any(raw, fields.id),
            txid: get_any(raw, fields.txid),
            timestamp,
            datetime: timestamp.and_then(iso8601),
            amount: get_any(raw, fields.amount),
            address: get_any(raw, fields.address),
            tag: get_any(raw, fields.tag),
            status: get_any::<String>(raw, fields.status)
                .map(|s| TransactionStatus::from(map_value(fields.status_map, &s))),
            transaction_type,
            updated: get_timestamp(raw, fields.updated),
            fee: get_any::<Decimal>(raw, fields.fee_cost).map(|cost| Fee {
                cost: Some(cost),
                currency: currency.clone(),
                rate: None,
            }),
            currency,
            info: raw.clone(),
        }
    }
}

/// Shortest funding address accepted unless a connector asks for more.
pub const MIN_ADDRESS_LENGTH: usize = 1;

/// Reject obviously malformed deposit or withdrawal addresses.
pub fn check_address(exchange: &str, address: Option<&str>) -> Result<String, ExchangeError> {
    check_address_min(exchange, address, MIN_ADDRESS_LENGTH)
}

/// [`check_address`] with a connector-specific minimum length.
pub fn check_address_min(
    exchange: &str,
    address: Option<&str>,
    min_length: usize,
) -> Result<String, ExchangeError> {
    let invalid = |reason: String| {
        ExchangeError::new(
            ErrorKind::InvalidAddress,
            exchange,
            format!("address {}: {:?}", reason, address.unwrap_or_default()),
        )
    };
    let address = address.ok_or_else(|| invalid("is missing".to_string()))?;
    let length = address.chars().count();
    if length == 0 || length < min_length {
        return Err(invalid(format!(
            "has less than {} characters",
            min_length.max(1)
        )));
    }
    let mut chars = address.chars();
    let first = chars.next();
    if chars.all(|c| Some(c) == first) {
        return Err(invalid("repeats one character".to_string()));
    }
    if address.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace".to_string()));
    }
    Ok(address.to_string())
}

/// Absent-aware decimal from either of two keys, for connector quirks.
pub fn decimal_either(raw: &Value, key1: &str, key2: &str) -> Option<Decimal> {
    safe::get_either(raw, key1, key2)
}

/// Keep records at or after `since`, then the first `limit` of them.
///
/// Records without a timestamp are dropped once `since` is given.
pub fn filter_by_since_limit<T, F>(
    items: Vec<T>,
    since: Option<i64>,
    limit: Option<u32>,
    timestamp: F,
) -> Vec<T>
where
    F: Fn(&T) -> Option<i64>,
{
    let filtered = items
        .into_iter()
        .filter(|item| since.map_or(true, |since| timestamp(item).is_some_and(|ts| ts >= since)));
    match limit {
        Some(limit) => filtered.take(limit as usize).collect(),
        None => filtered.collect(),
    }
}

/// Length of a unified timeframe such as `15m`, `4h` or `1M`, in seconds.
///
/// A month counts as 30 days and a year as 365.
pub fn timeframe_seconds(exchange: &str, timeframe: &str) -> Result<i64, ExchangeError> {
    let invalid = || {
        ExchangeError::new(
            ErrorKind::BadRequest,
            exchange,
            format!("unsupported timeframe {:?}", timeframe),
        )
    };
    let split = timeframe.len().checked_sub(1).ok_or_else(invalid)?;
    if !timeframe.is_char_boundary(split) {
        return Err(invalid());
    }
    let (amount, unit) = timeframe.split_at(split);
    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    let unit_seconds = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        "M" => 2_592_000,
        "y" => 31_536_000,
        _ => return Err(invalid()),
    };
    if amount <= 0 {
        return Err(invalid());
    }
    amount.checked_mul(unit_seconds).ok_or_else(invalid)
}

/// Order amount cut down to the market's amount precision.
pub fn amount_to_precision(market: &Market, amount: Decimal) -> Decimal {
    market
        .precision
        .amount
        .map_or(amount, |places| truncate_to_places(amount, places))
}

/// Order price rounded to the market's price precision.
pub fn price_to_precision(market: &Market, price: Decimal) -> Decimal {
    market
        .precision
        .price
        .map_or(price, |places| round_to_places(price, places))
}

/// Decimal request parameter in plain notation.
pub fn decimal_param(value: Decimal) -> Value {
    Value::String(value.normalize().to_string())
}
