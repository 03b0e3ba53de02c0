use crate::core::normalize::{
    build_market, min_max, BalanceFields, LevelFields, Normalizer, OrderFields, SymbolSplit,
    TickerFields, TradeFields, TransactionFields,
};
use crate::core::precision::places_from_tick;
use crate::core::safe::{get, get_any, get_bool, get_string, parse_timestamp};
use crate::core::types::{
    Fee, Market, MarketLimits, MarketPrecision, Ohlcv, Order, OrderSide, TakerOrMaker, Trade,
    Transaction, TransactionStatus, TransactionType,
};
use rust_decimal::Decimal;
use serde_json::Value;

/// Market ids are concatenated (`BTCUSDT`); symbols resolve via the cache.
pub const SPLIT: SymbolSplit = SymbolSplit::Opaque;

pub const TICKER: TickerFields = TickerFields {
    market_id: &["symbol"],
    timestamp: &["time"],
    high: &["highPrice"],
    low: &["lowPrice"],
    bid: &["bestBidPrice", "bidPrice"],
    bid_volume: &["bidQty"],
    ask: &["bestAskPrice", "askPrice"],
    ask_volume: &["askQty"],
    open: &["openPrice"],
    last: &["lastPrice"],
    base_volume: &["volume"],
    quote_volume: &["quoteVolume"],
    ..TickerFields::EMPTY
};

const TRADE: TradeFields = TradeFields {
    id: &["id"],
    order_id: &["orderId"],
    market_id: &["symbol"],
    timestamp: &["time"],
    price: &["price"],
    amount: &["qty"],
    fee_cost: &["commission"],
    fee_currency: &["commissionAsset"],
    ..TradeFields::EMPTY
};

const ORDER: OrderFields = OrderFields {
    id: &["orderId"],
    client_order_id: &["clientOrderId"],
    market_id: &["symbol"],
    timestamp: &["time", "transactTime"],
    order_type: &["type"],
    type_map: &[("LIMIT", "limit"), ("MARKET", "market")],
    side: &["side"],
    status: &["status"],
    status_map: &[
        ("NEW", "open"),
        ("CANCELED", "canceled"),
        ("FILLED", "closed"),
        ("PENDING_CANCEL", "canceled"),
    ],
    price: &["price"],
    amount: &["origQty"],
    filled: &["executedQty"],
    cost: &["cummulativeQuoteQty"],
    average: &["avgPrice"],
    ..OrderFields::EMPTY
};

/// Depth levels are `[price, quantity]` pairs.
pub const BOOK_LEVEL: LevelFields = LevelFields::PAIR;

pub const BALANCE: BalanceFields = BalanceFields {
    currency: &["asset", "tokenName"],
    free: &["free"],
    used: &["locked"],
    total: &[],
};

const TRANSACTION: TransactionFields = TransactionFields {
    id: &["orderId"],
    txid: &["txid"],
    timestamp: &["time"],
    currency: &["tokenId"],
    amount: &["quantity"],
    address: &["address"],
    tag: &["addressExt", "addressTag"],
    status: &["statusCode"],
    status_map: &[
        ("BROKER_AUDITING_STATUS", "pending"),
        ("BROKER_REJECT_STATUS", "failed"),
        ("AUDITING_STATUS", "pending"),
        ("AUDIT_REJECT_STATUS", "failed"),
        ("PROCESSING_STATUS", "pending"),
        ("WITHDRAWAL_SUCCESS_STATUS", "ok"),
        ("WITHDRAWAL_FAILURE_STATUS", "failed"),
        ("BLOCK_MINING_STATUS", "ok"),
    ],
    fee_cost: &["fee"],
    ..TransactionFields::EMPTY
};

fn filter_of<'a>(filters: &'a [Value], filter_type: &str) -> Option<&'a Value> {
    filters
        .iter()
        .find(|filter| get_string(filter, "filterType").as_deref() == Some(filter_type))
}

/// Spot market from one `brokerInfo.symbols` entry.
///
/// Precision is published as tick sizes and stored as decimal places.
pub fn parse_market(raw: &Value) -> Option<Market> {
    let id = get_string(raw, "symbol")?;
    let base_id = get_string(raw, "baseAsset")?;
    let quote_id = get_string(raw, "quoteAsset")?;
    let filters = raw
        .get("filters")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let lot = filter_of(filters, "LOT_SIZE");
    let price = filter_of(filters, "PRICE_FILTER");
    let notional = filter_of(filters, "MIN_NOTIONAL");
    let limits = MarketLimits {
        amount: min_max(
            lot.and_then(|f| get(f, "minQty")),
            lot.and_then(|f| get(f, "maxQty")),
        ),
        price: min_max(
            price.and_then(|f| get(f, "minPrice")),
            price.and_then(|f| get(f, "maxPrice")),
        ),
        cost: min_max(notional.and_then(|f| get(f, "minNotional")), None),
    };
    let precision = MarketPrecision {
        amount: get::<Decimal, _>(raw, "baseAssetPrecision").and_then(places_from_tick),
        price: get_any::<Decimal>(raw, &["quotePrecision", "quoteAssetPrecision"])
            .and_then(places_from_tick),
    };
    Some(build_market(
        id,
        &base_id,
        &quote_id,
        Some(true),
        precision,
        limits,
        raw.clone(),
    ))
}

/// Public trades carry `isBuyerMaker`; account trades carry `isBuyer` and
/// `isMaker`.
pub fn parse_trade(normalizer: &Normalizer<'_>, raw: &Value, hint: Option<&Market>) -> Trade {
    let mut trade = normalizer.parse_trade(raw, hint, &TRADE);
    if let Some(buyer_maker) = get_bool(raw, "isBuyerMaker") {
        trade.side = Some(if buyer_maker {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        });
    } else {
        trade.taker_or_maker = get_bool(raw, "isMaker").map(|maker| {
            if maker {
                TakerOrMaker::Maker
            } else {
                TakerOrMaker::Taker
            }
        });
        trade.side = get_bool(raw, "isBuyer").map(|buyer| {
            if buyer {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            }
        });
    }
    trade
}

/// Order record; a market order reports no price, and a market buy states
/// its size in quote currency so its amount is unknown.
pub fn parse_order(normalizer: &Normalizer<'_>, raw: &Value, hint: Option<&Market>) -> Order {
    let mut record = raw.clone();
    if let Some(fields) = record.as_object_mut() {
        let is_market = fields
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case("market"));
        if is_market {
            fields.remove("price");
            let is_buy = fields
                .get("side")
                .and_then(Value::as_str)
                .is_some_and(|s| s.eq_ignore_ascii_case("buy"));
            if is_buy {
                fields.remove("origQty");
            }
        }
        if get::<Decimal, _>(raw, "avgPrice").is_some_and(|avg| avg.is_zero()) {
            fields.remove("avgPrice");
        }
    }

    let mut order = normalizer.parse_order(&record, hint, &ORDER);
    order.info = raw.clone();
    let first_fee = raw
        .get("fees")
        .and_then(Value::as_array)
        .and_then(|fees| fees.iter().find(|fee| get::<Decimal, _>(fee, "fee").is_some()));
    if let Some(fee) = first_fee {
        order.fee = Some(Fee {
            cost: get(fee, "fee"),
            currency: get_string(fee, "feeToken").map(|c| normalizer.currency_code(&c)),
            rate: None,
        });
    }
    order
}

/// Deposit or withdrawal record. Deposits carry no status code and are
/// reported once credited.
pub fn parse_transaction(
    normalizer: &Normalizer<'_>,
    raw: &Value,
    transaction_type: TransactionType,
) -> Transaction {
    let mut transaction = normalizer.parse_transaction(raw, &TRANSACTION, Some(transaction_type));
    transaction.tag = transaction.tag.filter(|tag| !tag.is_empty());
    transaction.txid = transaction.txid.filter(|txid| !txid.is_empty());
    if transaction.status.is_none() && transaction_type == TransactionType::Deposit {
        transaction.status = Some(TransactionStatus::Ok);
    }
    if let Some(fee) = transaction.fee.as_mut() {
        fee.currency = get_string(raw, "feeTokenId")
            .map(|c| normalizer.currency_code(&c))
            .or_else(|| fee.currency.take());
    }
    transaction
}

/// Kline intervals, named as the unified timeframes.
pub const TIMEFRAMES: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

/// One kline: `[openTime, open, high, low, close, volume, closeTime, ...]`.
pub fn parse_ohlcv(raw: &Value) -> Option<Ohlcv> {
    Some(Ohlcv {
        timestamp: raw.get(0).and_then(parse_timestamp)?,
        open: get(raw, 1),
        high: get(raw, 2),
        low: get(raw, 3),
        close: get(raw, 4),
        volume: get(raw, 5),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markets::MarketCache;
    use crate::core::types::{OrderStatus, OrderType};
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn broker_symbol() -> Value {
        json!({
            "filters": [
                {"minPrice": "0.01", "maxPrice": "100000.00000000", "tickSize": "0.01", "filterType": "PRICE_FILTER"},
                {"minQty": "0.0005", "maxQty": "100000.00000000", "stepSize": "0.000001", "filterType": "LOT_SIZE"},
                {"minNotional": "5", "filterType": "MIN_NOTIONAL"}
            ],
            "exchangeId": "301",
            "symbol": "BTCUSDT",
            "symbolName": "BTCUSDT",
            "status": "TRADING",
            "baseAsset": "BTC",
            "baseAssetPrecision": "0.000001",
            "quoteAsset": "USDT",
            "quotePrecision": "0.01",
            "icebergAllowed": false
        })
    }

    fn cache() -> MarketCache {
        MarketCache::from_markets(vec![parse_market(&broker_symbol()).unwrap()])
    }

    #[test]
    fn test_parse_market_filters_and_ticks() {
        let market = parse_market(&broker_symbol()).unwrap();
        assert_eq!(market.symbol, "BTC/USDT");
        assert_eq!(market.id, "BTCUSDT");
        assert_eq!(market.precision.amount, Some(6));
        assert_eq!(market.precision.price, Some(2));
        assert_eq!(market.limits.amount.min, Some(dec("0.0005")));
        assert_eq!(market.limits.price.max, Some(dec("100000")));
        assert_eq!(market.limits.cost.min, Some(dec("5")));
    }

    #[test]
    fn test_ticker_derivations() {
        let cache = cache();
        let normalizer = Normalizer::new("hbtc", &cache, SPLIT);
        let raw = json!({
            "time": 1_588_069_860_794_i64,
            "symbol": "BTCUSDT",
            "bestBidPrice": "7707.02",
            "bestAskPrice": "7707.19",
            "volume": "2",
            "quoteVolume": "15000",
            "lastPrice": "7708",
            "highPrice": "7810.41",
            "lowPrice": "7612.26",
            "openPrice": "7700",
        });
        let ticker = normalizer.parse_ticker(&raw, None, &TICKER);
        assert_eq!(ticker.symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(ticker.timestamp, Some(1_588_069_860_794));
        assert_eq!(ticker.bid, Some(dec("7707.02")));
        assert_eq!(ticker.change, Some(dec("8")));
        assert_eq!(ticker.vwap, Some(dec("7500")));
        assert_eq!(ticker.average, Some(dec("7704")));
    }

    #[test]
    fn test_public_trade_side_from_buyer_maker() {
        let cache = cache();
        let normalizer = Normalizer::new("hbtc", &cache, SPLIT);
        let raw = json!({"price": "0.02", "time": 1_580_000_000_000_i64, "qty": "3", "isBuyerMaker": true});
        let trade = parse_trade(&normalizer, &raw, cache.by_id("BTCUSDT"));
        assert_eq!(trade.side, Some(OrderSide::Sell));
        assert_eq!(trade.cost, Some(dec("0.06")));
        assert_eq!(trade.symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(trade.taker_or_maker, None);
    }

    #[test]
    fn test_account_trade_fee_and_liquidity() {
        let cache = cache();
        let normalizer = Normalizer::new("hbtc", &cache, SPLIT);
        let raw = json!({
            "id": "616384027512920576",
            "symbol": "BTCUSDT",
            "orderId": "616384027202542080",
            "price": "9000",
            "qty": "0.001",
            "commission": "0.009",
            "commissionAsset": "USDT",
            "time": "1589800000000",
            "isBuyer": true,
            "isMaker": false,
        });
        let trade = parse_trade(&normalizer, &raw, None);
        assert_eq!(trade.side, Some(OrderSide::Buy));
        assert_eq!(trade.taker_or_maker, Some(TakerOrMaker::Taker));
        assert_eq!(trade.order.as_deref(), Some("616384027202542080"));
        let fee = trade.fee.unwrap();
        assert_eq!(fee.cost, Some(dec("0.009")));
        assert_eq!(fee.currency.as_deref(), Some("USDT"));
    }

    #[test]
    fn test_limit_order_remaining() {
        let cache = cache();
        let normalizer = Normalizer::new("hbtc", &cache, SPLIT);
        let raw = json!({
            "symbol": "BTCUSDT",
            "orderId": "499890200602846976",
            "clientOrderId": "157432755564968",
            "transactTime": "1574327555669",
            "price": "6000",
            "origQty": "0.002",
            "executedQty": "0.0005",
            "status": "NEW",
            "type": "LIMIT",
            "side": "BUY",
            "avgPrice": "0",
            "fees": [],
        });
        let order = parse_order(&normalizer, &raw, None);
        assert_eq!(order.symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(order.order_type, Some(OrderType::Limit));
        assert_eq!(order.side, Some(OrderSide::Buy));
        assert_eq!(order.status, Some(OrderStatus::Open));
        assert_eq!(order.timestamp, Some(1_574_327_555_669));
        assert_eq!(order.remaining, Some(dec("0.0015")));
        assert_eq!(order.average, Some(dec("6000")));
        assert_eq!(order.info, raw);
    }

    #[test]
    fn test_market_buy_order_has_no_price_or_amount() {
        let cache = cache();
        let normalizer = Normalizer::new("hbtc", &cache, SPLIT);
        let raw = json!({
            "symbol": "BTCUSDT",
            "orderId": "1",
            "time": 1_574_327_555_669_i64,
            "price": "0",
            "origQty": "100",
            "executedQty": "0.01",
            "cummulativeQuoteQty": "99.5",
            "avgPrice": "9950",
            "status": "FILLED",
            "type": "MARKET",
            "side": "BUY",
            "fees": [{"feeToken": "BTC", "fee": "0.00001"}],
        });
        let order = parse_order(&normalizer, &raw, None);
        assert_eq!(order.price, None);
        assert_eq!(order.amount, None);
        assert_eq!(order.status, Some(OrderStatus::Closed));
        assert_eq!(order.cost, Some(dec("99.5")));
        let fee = order.fee.unwrap();
        assert_eq!(fee.currency.as_deref(), Some("BTC"));
        assert_eq!(fee.cost, Some(dec("0.00001")));
    }

    #[test]
    fn test_deposit_defaults_to_ok() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("hbtc", &cache, SPLIT);
        let raw = json!({
            "time": "1565769575929",
            "orderId": "428100569859739648",
            "token": "USDT",
            "address": "0x1234567890abcdef",
            "addressTag": "",
            "quantity": "100",
            "txid": "",
            "tokenId": "USDT",
        });
        let tx = parse_transaction(&normalizer, &raw, TransactionType::Deposit);
        assert_eq!(tx.status, Some(TransactionStatus::Ok));
        assert_eq!(tx.tag, None);
        assert_eq!(tx.txid, None);
        assert_eq!(tx.timestamp, Some(1_565_769_575_929));
        assert_eq!(tx.currency.as_deref(), Some("USDT"));
    }

    #[test]
    fn test_withdrawal_status_and_fee_token() {
        let cache = MarketCache::new();
        let normalizer = Normalizer::new("hbtc", &cache, SPLIT);
        let raw = json!({
            "time": "1536232111669",
            "orderId": "90161227158286336",
            "tokenId": "EOS",
            "address": "eosexample1",
            "addressExt": "memo-1",
            "quantity": "14",
            "fee": "0.1",
            "feeTokenId": "EOS",
            "statusCode": "AUDITING_STATUS",
            "txid": "abc",
        });
        let tx = parse_transaction(&normalizer, &raw, TransactionType::Withdrawal);
        assert_eq!(tx.status, Some(TransactionStatus::Pending));
        assert_eq!(tx.tag.as_deref(), Some("memo-1"));
        assert_eq!(tx.fee.and_then(|f| f.currency).as_deref(), Some("EOS"));
    }

    #[test]
    fn test_parse_kline() {
        let raw = json!([1_587_906_360_000_i64, "0.1761", "0.1848", "0.1761", "0.1848", "53", 0, "9.7944", 1, "0", "0"]);
        let candle = parse_ohlcv(&raw).unwrap();
        assert_eq!(candle.timestamp, 1_587_906_360_000);
        assert_eq!(candle.high, Some(dec("0.1848")));
        assert_eq!(candle.volume, Some(dec("53")));
        assert!(parse_ohlcv(&json!({"t": 1})).is_none());
    }
}
