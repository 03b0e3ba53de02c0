mod common;

use common::{dec, query_pairs, MockTransport};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};
use std::sync::Arc;
use unifex::core::kernel::{hash_hex, FixedNonce, HashAlgorithm};
use unifex::exchanges::upbit::signer::UpbitClaims;
use unifex::exchanges::upbit::{UpbitBuilder, UpbitConnector};
use unifex::{
    AccountInfo, ErrorKind, ExchangeConfig, ExchangeConnector, MarketDataSource, OrderPlacer,
    OrderRequest, OrderSide, OrderStatus, OrderType, TransactionStatus, TransactionType,
};

fn connector(mock: &MockTransport, authenticated: bool) -> UpbitConnector<MockTransport> {
    let config = if authenticated {
        ExchangeConfig::new("access".to_string(), "secret".to_string())
    } else {
        ExchangeConfig::read_only()
    };
    UpbitBuilder::new()
        .with_config(config)
        .with_rate_limit(None)
        .with_nonce_source(Arc::new(FixedNonce(42)))
        .build_with_transport(mock.clone())
        .unwrap()
}

fn market_all() -> Value {
    json!([
        {"market": "KRW-BTC", "korean_name": "비트코인", "english_name": "Bitcoin"},
        {"market": "KRW-ETH", "korean_name": "이더리움", "english_name": "Ethereum"},
        {"market": "BTC-ETH", "korean_name": "이더리움", "english_name": "Ethereum"}
    ])
}

async fn loaded(mock: &MockTransport, authenticated: bool) -> UpbitConnector<MockTransport> {
    mock.respond(200, &market_all());
    let mut connector = connector(mock, authenticated);
    connector.load_markets(false).await.unwrap();
    connector
}

fn claims(token_header: Option<&str>) -> UpbitClaims {
    let token = token_header.and_then(|h| h.strip_prefix("Bearer ")).unwrap();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    decode::<UpbitClaims>(token, &DecodingKey::from_secret(b"secret"), &validation)
        .unwrap()
        .claims
}

#[tokio::test]
async fn test_markets_quote_first_ids() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, false).await;

    assert_eq!(
        connector.markets().symbols(),
        vec!["BTC/KRW", "ETH/BTC", "ETH/KRW"]
    );
    for market in connector.markets().markets() {
        assert_eq!(
            connector.markets().by_id(&market.id).unwrap().symbol,
            market.symbol
        );
    }
    assert_eq!(mock.last_request().url, "https://api.upbit.com/v1/market/all");
}

#[tokio::test]
async fn test_tickers_request_all_cached_ids() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, false).await;
    mock.respond(
        200,
        &json!([
            {"market": "KRW-BTC", "trade_price": 6_287_000, "opening_price": 6_227_000},
            {"market": "KRW-ETH", "trade_price": 200_000, "opening_price": 190_000}
        ]),
    );

    let tickers = connector.fetch_tickers(None).await.unwrap();
    assert_eq!(tickers.len(), 2);
    assert_eq!(tickers["BTC/KRW"].change, Some(dec("60000")));
    assert_eq!(tickers["ETH/KRW"].last, Some(dec("200000")));
    assert_eq!(
        query_pairs(&mock.last_request().url),
        vec![("markets".to_string(), "BTC-ETH,KRW-BTC,KRW-ETH".to_string())]
    );
}

#[tokio::test]
async fn test_tickers_before_load_markets_fail() {
    let mock = MockTransport::new();
    let connector = connector(&mock, false);
    let err = connector.fetch_tickers(None).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::BadSymbol));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_order_book_limit_trims_levels() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, false).await;
    mock.respond(
        200,
        &json!([{
            "market": "KRW-BTC",
            "timestamp": 1_542_690_000_000_i64,
            "orderbook_units": [
                {"ask_price": 101, "bid_price": 99, "ask_size": 1, "bid_size": 2},
                {"ask_price": 102, "bid_price": 98, "ask_size": 3, "bid_size": 4},
                {"ask_price": 103, "bid_price": 97, "ask_size": 5, "bid_size": 6}
            ]
        }]),
    );

    let book = connector.fetch_order_book("BTC/KRW", Some(2)).await.unwrap();
    assert_eq!(book.bids.len(), 2);
    assert_eq!(book.asks.len(), 2);
    assert_eq!(book.bids[0].price, dec("99"));
    assert_eq!(book.asks[1].price, dec("102"));
    assert_eq!(book.timestamp, Some(1_542_690_000_000));
}

#[tokio::test]
async fn test_classified_errors() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, true).await;
    mock.respond(
        400,
        &json!({"error": {"name": "insufficient_funds_ask", "message": "주문가능한 금액(ETH)이 부족합니다."}}),
    )
    .respond(
        401,
        &json!({"error": {"name": "expired_access_key", "message": "This key has expired."}}),
    )
    .respond(400, &json!({"error": {"name": "brand_new", "message": "unheard of"}}));

    let sell = OrderRequest::limit("ETH/KRW", OrderSide::Sell, dec("1"), dec("200000"));
    let err = connector.create_order(sell).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InsufficientFunds));

    let err = connector.fetch_balance().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Authentication));

    let err = connector.fetch_balance().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Exchange));
    assert!(err.feedback().unwrap_or_default().contains("brand_new"));
}

#[tokio::test]
async fn test_limit_order_body_and_token() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, true).await;
    mock.respond(
        201,
        &json!({
            "uuid": "cdd92199-2897-4e14-9448-f923320408ad",
            "side": "bid",
            "ord_type": "limit",
            "price": "100.0",
            "state": "wait",
            "market": "KRW-BTC",
            "created_at": "2018-04-10T15:42:23+09:00",
            "volume": "0.01",
            "remaining_volume": "0.01",
            "paid_fee": "0.0",
            "executed_volume": "0.0",
            "trades_count": 0
        }),
    );

    let mut request = OrderRequest::limit("BTC/KRW", OrderSide::Buy, dec("0.01"), dec("100"));
    request.client_order_id = Some("my-order-1".to_string());
    let order = connector.create_order(request).await.unwrap();
    assert_eq!(order.id.as_deref(), Some("cdd92199-2897-4e14-9448-f923320408ad"));
    assert_eq!(order.status, Some(OrderStatus::Open));
    assert_eq!(order.remaining, Some(dec("0.01")));
    assert_eq!(order.timestamp, Some(1_523_342_543_000));

    let sent = mock.last_request();
    assert_eq!(sent.url, "https://api.upbit.com/v1/orders");
    let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({
            "identifier": "my-order-1",
            "market": "KRW-BTC",
            "ord_type": "limit",
            "price": "100",
            "side": "bid",
            "volume": "0.01"
        })
    );
    let claims = claims(sent.header("Authorization"));
    assert_eq!(claims.access_key, "access");
    assert_eq!(claims.nonce, "42");
    let expected = hash_hex(
        HashAlgorithm::Sha512,
        b"identifier=my-order-1&market=KRW-BTC&ord_type=limit&price=100&side=bid&volume=0.01",
    );
    assert_eq!(claims.query_hash.as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn test_market_buy_spends_amount_times_price() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, true).await;
    mock.respond(
        201,
        &json!({"uuid": "u1", "side": "bid", "ord_type": "price", "price": "5000.0",
                "state": "wait", "market": "KRW-BTC", "executed_volume": "0.0"}),
    );

    let request = OrderRequest {
        symbol: "BTC/KRW".to_string(),
        order_type: OrderType::Market,
        side: OrderSide::Buy,
        amount: dec("0.5"),
        price: Some(dec("10000")),
        client_order_id: None,
    };
    let order = connector.create_order(request).await.unwrap();
    assert_eq!(order.order_type, Some(OrderType::Market));
    assert_eq!(order.cost, Some(dec("5000")));
    assert_eq!(order.price, None);

    let body: Value = serde_json::from_str(mock.last_request().body.as_deref().unwrap()).unwrap();
    assert_eq!(body["ord_type"], "price");
    assert_eq!(body["price"], "5000");
    assert!(body.get("volume").is_none());
}

#[tokio::test]
async fn test_market_buy_without_price_is_rejected_locally() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, true).await;
    let request = OrderRequest {
        symbol: "BTC/KRW".to_string(),
        order_type: OrderType::Market,
        side: OrderSide::Buy,
        amount: dec("0.5"),
        price: None,
        client_order_id: None,
    };
    let err = connector.create_order(request).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidOrder));
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn test_cancel_uses_delete_query() {
    let mock = MockTransport::new();
    let connector = connector(&mock, true);
    mock.respond(
        200,
        &json!({"uuid": "abc", "side": "ask", "ord_type": "limit", "price": "4000000.0",
                "state": "cancel", "market": "KRW-BTC", "volume": "1.0",
                "remaining_volume": "1.0", "executed_volume": "0.0"}),
    );

    let order = connector.cancel_order("abc", None).await.unwrap();
    assert_eq!(order.status, Some(OrderStatus::Canceled));
    assert_eq!(order.symbol.as_deref(), Some("BTC/KRW"));
    assert_eq!(order.side, Some(OrderSide::Sell));

    let sent = mock.last_request();
    assert_eq!(sent.method, reqwest::Method::DELETE);
    assert_eq!(sent.url, "https://api.upbit.com/v1/order?uuid=abc");
    assert!(sent.body.is_none());
    let claims = claims(sent.header("Authorization"));
    assert_eq!(
        claims.query_hash,
        Some(hash_hex(HashAlgorithm::Sha512, b"uuid=abc"))
    );
}

#[tokio::test]
async fn test_fetch_orders_queries_each_state() {
    let mock = MockTransport::new();
    let connector = connector(&mock, true);
    mock.respond(
        200,
        &json!([{"uuid": "a", "side": "bid", "ord_type": "limit", "price": "100", "state": "wait",
                  "market": "KRW-BTC", "created_at": "2018-04-10T15:42:25+09:00",
                  "volume": "1", "remaining_volume": "1", "executed_volume": "0"}]),
    )
    .respond(
        200,
        &json!([{"uuid": "b", "side": "bid", "ord_type": "limit", "price": "100", "state": "done",
                  "market": "KRW-BTC", "created_at": "2018-04-10T15:42:23+09:00",
                  "volume": "1", "remaining_volume": "0", "executed_volume": "1"}]),
    )
    .respond(200, &json!([]));

    let orders = connector.fetch_orders(None, None, None).await.unwrap();
    let ids: Vec<_> = orders.iter().filter_map(|o| o.id.as_deref()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    let states: Vec<String> = mock
        .requests()
        .iter()
        .flat_map(|r| query_pairs(&r.url))
        .filter(|(k, _)| k == "state")
        .map(|(_, v)| v)
        .collect();
    assert_eq!(states, vec!["wait", "done", "cancel"]);
}

#[tokio::test]
async fn test_balance_and_withdrawals() {
    let mock = MockTransport::new();
    let connector = connector(&mock, true);
    mock.respond(
        200,
        &json!([
            {"currency": "KRW", "balance": "1000000.0", "locked": "0.0", "avg_krw_buy_price": "0", "modified": false},
            {"currency": "BTC", "balance": "2.0", "locked": "0.5", "avg_krw_buy_price": "7000000", "modified": false}
        ]),
    )
    .respond(
        200,
        &json!([{
            "type": "withdraw",
            "uuid": "35a4f1dc-1db5-4d6b-89b5-7ec137875956",
            "currency": "BTC",
            "txid": "b3f1",
            "state": "DONE",
            "created_at": "2019-01-04T13:48:09+09:00",
            "done_at": "2019-01-04T14:00:00+09:00",
            "amount": "0.01",
            "fee": "0.0005"
        }]),
    );

    let balances = connector.fetch_balance().await.unwrap();
    let btc = &balances.currencies["BTC"];
    assert_eq!(btc.free, Some(dec("2.0")));
    assert_eq!(btc.used, Some(dec("0.5")));
    assert_eq!(btc.total, Some(dec("2.5")));

    let withdrawals = connector.fetch_withdrawals(Some("BTC"), None, Some(10)).await.unwrap();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].transaction_type, Some(TransactionType::Withdrawal));
    assert_eq!(withdrawals[0].status, Some(TransactionStatus::Ok));
    assert_eq!(withdrawals[0].updated, Some(1_546_578_000_000));
    let query = query_pairs(&mock.last_request().url);
    assert!(query.contains(&("currency".to_string(), "BTC".to_string())));
    assert!(query.contains(&("limit".to_string(), "10".to_string())));
}

#[tokio::test]
async fn test_withdraw_routes_fiat_and_coin() {
    let mock = MockTransport::new();
    let connector = connector(&mock, true);
    mock.respond(201, &json!({"type": "withdraw", "uuid": "coin-1", "currency": "BTC", "state": "submitting"}))
        .respond(201, &json!({"type": "withdraw", "uuid": "krw-1", "currency": "KRW", "state": "submitting"}));

    let receipt = connector
        .withdraw("BTC", dec("0.01"), "3EusRwybuZUhVDeHL7gh3HSLmbhLcy7NqD", Some("memo-1"))
        .await
        .unwrap();
    assert_eq!(receipt.id.as_deref(), Some("coin-1"));
    let sent = mock.last_request();
    assert_eq!(sent.url, "https://api.upbit.com/v1/withdraws/coin");
    let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["secondary_address"], "memo-1");
    assert_eq!(body["amount"], "0.01");

    let receipt = connector
        .withdraw("KRW", dec("10000"), "3EusRwybuZUhVDeHL7gh3HSLmbhLcy7NqD", None)
        .await
        .unwrap();
    assert_eq!(receipt.id.as_deref(), Some("krw-1"));
    let sent = mock.last_request();
    assert_eq!(sent.url, "https://api.upbit.com/v1/withdraws/krw");
    let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"amount": "10000"}));
}

#[tokio::test]
async fn test_deposit_address_is_checked() {
    let mock = MockTransport::new();
    let connector = connector(&mock, true);
    mock.respond(
        200,
        &json!({"currency": "BTC", "deposit_address": "3EusRwybuZUhVDeHL7gh3HSLmbhLcy7NqD", "secondary_address": null}),
    )
    .respond(200, &json!({"currency": "BTC", "deposit_address": "xxxxxxxxxx"}));

    let address = connector.fetch_deposit_address("BTC").await.unwrap();
    assert_eq!(address.address, "3EusRwybuZUhVDeHL7gh3HSLmbhLcy7NqD");
    assert_eq!(address.tag, None);
    assert_eq!(
        query_pairs(&mock.last_request().url),
        vec![("currency".to_string(), "BTC".to_string())]
    );

    let err = connector.fetch_deposit_address("BTC").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidAddress));
}

#[tokio::test]
async fn test_private_call_without_credentials_sends_nothing() {
    let mock = MockTransport::new();
    let connector = connector(&mock, false);
    let err = connector.fetch_balance().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Authentication));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_minute_candles_oldest_first() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, false).await;
    mock.respond(
        200,
        &json!([
            {"market": "KRW-BTC", "candle_date_time_utc": "2018-11-22T13:48:00",
             "opening_price": 101, "high_price": 103, "low_price": 100, "trade_price": 102,
             "timestamp": 1_542_894_480_000_i64, "candle_acc_trade_volume": 2.5, "unit": 1},
            {"market": "KRW-BTC", "candle_date_time_utc": "2018-11-22T13:47:00",
             "opening_price": 100, "high_price": 101, "low_price": 99, "trade_price": 101,
             "timestamp": 1_542_894_420_000_i64, "candle_acc_trade_volume": 1.5, "unit": 1}
        ]),
    );

    let candles = connector
        .fetch_ohlcv("BTC/KRW", "1m", Some(1_542_894_420_000), Some(2))
        .await
        .unwrap();
    let times: Vec<i64> = candles.iter().map(|c| c.timestamp).collect();
    assert_eq!(times, vec![1_542_894_420_000, 1_542_894_480_000]);
    assert_eq!(candles[1].close, Some(dec("102")));
    assert_eq!(candles[0].volume, Some(dec("1.5")));

    let sent = mock.last_request();
    assert!(sent.url.starts_with("https://api.upbit.com/v1/candles/minutes/1?"));
    let query = query_pairs(&sent.url);
    assert!(query.contains(&("market".to_string(), "KRW-BTC".to_string())));
    assert!(query.contains(&("count".to_string(), "2".to_string())));
    assert!(query.contains(&("to".to_string(), "2018-11-22T13:49:00.000Z".to_string())));
    assert!(!query.iter().any(|(k, _)| k == "unit"));
}

#[tokio::test]
async fn test_day_candles_use_named_route() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, false).await;
    mock.respond(200, &json!([]));

    let candles = connector.fetch_ohlcv("ETH/BTC", "1d", None, None).await.unwrap();
    assert!(candles.is_empty());
    let sent = mock.last_request();
    assert!(sent.url.starts_with("https://api.upbit.com/v1/candles/days?"));
    let query = query_pairs(&sent.url);
    assert!(query.contains(&("market".to_string(), "BTC-ETH".to_string())));
    assert!(query.contains(&("count".to_string(), "200".to_string())));
    assert!(!query.iter().any(|(k, _)| k == "to" || k == "timeframe"));

    let sent = mock.request_count();
    let err = connector.fetch_ohlcv("ETH/BTC", "2h", None, None).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::BadRequest));
    assert_eq!(mock.request_count(), sent);
}

#[tokio::test]
async fn test_canceled_orders_query_cancel_state() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, true).await;
    mock.respond(
        200,
        &json!([{"uuid": "c", "side": "ask", "ord_type": "limit", "price": "100", "state": "cancel",
                  "market": "KRW-BTC", "created_at": "2018-04-10T15:42:23+09:00",
                  "volume": "1", "remaining_volume": "1", "executed_volume": "0"}]),
    );

    let orders = connector
        .fetch_canceled_orders(Some("BTC/KRW"), None, None)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, Some(OrderStatus::Canceled));
    assert_eq!(orders[0].symbol.as_deref(), Some("BTC/KRW"));

    let query = query_pairs(&mock.last_request().url);
    assert!(query.contains(&("state".to_string(), "cancel".to_string())));
    assert!(query.contains(&("market".to_string(), "KRW-BTC".to_string())));
}

#[tokio::test]
async fn test_trading_fee_from_order_chance() {
    let mock = MockTransport::new();
    let connector = loaded(&mock, true).await;
    mock.respond(
        200,
        &json!({
            "bid_fee": "0.0005",
            "ask_fee": "0.0005",
            "maker_bid_fee": "0.0002",
            "maker_ask_fee": "0.0003",
            "market": {"id": "KRW-BTC", "name": "BTC/KRW", "state": "active"}
        }),
    );

    let fee = connector.fetch_trading_fee("BTC/KRW").await.unwrap();
    assert_eq!(fee.symbol, "BTC/KRW");
    assert_eq!(fee.taker, Some(dec("0.0005")));
    assert_eq!(fee.maker, Some(dec("0.0003")));

    let sent = mock.last_request();
    assert!(sent.url.starts_with("https://api.upbit.com/v1/orders/chance?"));
    assert_eq!(
        query_pairs(&sent.url),
        vec![("market".to_string(), "KRW-BTC".to_string())]
    );
    assert!(sent.header("Authorization").is_some_and(|h| h.starts_with("Bearer ")));
}

#[tokio::test]
async fn test_unsupported_operations() {
    let mock = MockTransport::new();
    let connector = connector(&mock, true);
    let err = connector.fetch_time().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotSupported));
    let err = connector.cancel_all_orders(None).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotSupported));
    let err = connector.fetch_my_trades(None, None, None).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotSupported));
    assert_eq!(mock.request_count(), 0);
}
