//! Bitfinex adapter behavior against scripted exchange responses.

mod support;

use std::sync::Arc;

use coinbridge::adapter::bitfinex::BitfinexClient;
use coinbridge::domain::{OrderSide, OrderStatus};
use coinbridge::error::ExchangeError;
use coinbridge::exchange::{Exchange, Method};
use coinbridge::testkit::domain::{anonymous_context, context, list_pair, placed_order, shared};
use coinbridge::testkit::transport::ScriptedTransport;
use rust_decimal_macros::dec;

use support::adapter::{exchange_error, header_payload, scripted};

const SYMBOLS: &str = r#"[[["ALG","ALGO"],["UST","USDT"]]]"#;
const LABELS: &str = r#"[[["BTC","Bitcoin"],["USD","US Dollar"],["ALG","Algorand"]]]"#;

#[tokio::test]
async fn coin_discovery_maps_display_codes_and_withdraw_fees() {
    let fees = r#"{"withdraw":{"BTC":"0.0004","USD":0,"DOGE":"5"}}"#;
    let (shared, transport) = scripted(&[SYMBOLS, LABELS, fees]);
    let client = BitfinexClient::new(context(&shared, transport.clone()));

    client.get_coins_data().await;

    let algo = shared.registry.lookup_coin("ALGO").expect("ALGO registered");
    let constraint = shared.constraints.coin("bitfinex", &algo).unwrap();
    assert_eq!(constraint.ex_symbol, "ALG");
    assert_eq!(constraint.confirmation, 2);
    assert!(constraint.listed);

    let btc = shared.registry.lookup_coin("BTC").unwrap();
    assert_eq!(btc.name(), "Bitcoin");
    assert_eq!(shared.constraints.coin("bitfinex", &btc).unwrap().tx_fee, dec!(0.0004));
    assert!(shared.registry.lookup_coin("DOGE").is_none());

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].url, "https://api.test/v2/conf/pub:map:currency:sym");
    assert_eq!(requests[2].method, Method::Post);
    assert_eq!(requests[2].header_value("X-BFX-APIKEY"), Some("test-key"));
}

#[tokio::test]
async fn coin_discovery_without_credentials_keeps_default_fees() {
    let (shared, transport) = scripted(&[SYMBOLS, LABELS]);
    let client = BitfinexClient::new(anonymous_context(&shared, transport.clone()));

    client.get_coins_data().await;

    assert_eq!(transport.request_count(), 2);
    let btc = shared.registry.lookup_coin("BTC").unwrap();
    assert_eq!(shared.constraints.coin("bitfinex", &btc).unwrap().tx_fee, dec!(0));
}

#[tokio::test]
async fn pair_discovery_splits_concatenated_symbols() {
    let details = r#"[
        {"pair":"btcusd","price_precision":5,"minimum_order_size":"0.0006"},
        {"pair":"algusd","price_precision":4},
        {"pair":"xyzeth","price_precision":5},
        {"pair":"testbtc:testusd","price_precision":5}
    ]"#;
    let (shared, transport) = scripted(&[SYMBOLS, LABELS, details]);
    let client = BitfinexClient::new(anonymous_context(&shared, transport));

    client.get_coins_data().await;
    client.get_pairs_data().await;

    let pairs = shared.constraints.pairs_for("bitfinex");
    assert_eq!(pairs.len(), 2);

    let btcusd = pairs.iter().find(|c| c.ex_symbol == "btcusd").unwrap();
    assert_eq!(btcusd.pair.to_string(), "BTC/USD");
    assert_eq!(btcusd.maker_fee, dec!(0.001));
    assert_eq!(btcusd.taker_fee, dec!(0.002));
    assert_eq!(btcusd.price_filter, dec!(0.00001));

    let algusd = pairs.iter().find(|c| c.ex_symbol == "algusd").unwrap();
    assert_eq!(algusd.pair.base().code(), "ALGO");
    assert_eq!(algusd.price_filter, dec!(0.0001));
}

#[tokio::test]
async fn failed_discovery_leaves_state_untouched() {
    let (shared, transport) = scripted(&["<html>502 Bad Gateway</html>"]);
    let client = BitfinexClient::new(anonymous_context(&shared, transport));

    client.get_coins_data().await;

    assert!(shared.registry.coins().is_empty());
    assert!(shared.constraints.coins_for("bitfinex").is_empty());
}

#[tokio::test]
async fn order_book_parses_levels_and_stamps_latency() {
    let book = r#"{
        "bids":[{"price":"100.5","amount":"2","timestamp":"1600000000.0"},{"price":"100.4","amount":"1","timestamp":"1600000000.0"}],
        "asks":[{"price":"101","amount":"1.5","timestamp":"1600000000.0"}]
    }"#;
    let shared = shared();
    let transport = Arc::new(ScriptedTransport::new().with_response(book).with_ip("10.0.0.1"));
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(anonymous_context(&shared, transport.clone()));

    let maker = client.order_book(&pair).await.unwrap();

    assert_eq!(maker.bids().len(), 2);
    assert_eq!(maker.best_bid().unwrap().rate(), dec!(100.5));
    assert_eq!(maker.best_ask().unwrap().quantity(), dec!(1.5));
    assert_eq!(maker.worker_ip(), "10.0.0.1");
    assert!(maker.after_timestamp() >= maker.before_timestamp());
    assert_eq!(
        transport.last_request().unwrap().url,
        "https://api.test/v1/book/btcusd"
    );
}

#[tokio::test]
async fn order_book_rejects_unparsable_levels() {
    let book = r#"{"bids":[{"price":"abc","amount":"2"}],"asks":[]}"#;
    let (shared, transport) = scripted(&[book]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(anonymous_context(&shared, transport));

    let err = exchange_error(client.order_book(&pair).await.unwrap_err());
    assert!(matches!(err, ExchangeError::InvalidNumber { field: "rate", .. }));
}

#[tokio::test]
async fn order_book_for_unlisted_pair_sends_nothing() {
    let (shared, transport) = scripted(&[]);
    let usd = shared.registry.register_coin("USD", "");
    let eth = shared.registry.register_coin("ETH", "");
    let pair = shared.registry.register_pair(&eth, &usd);
    let client = BitfinexClient::new(anonymous_context(&shared, transport.clone()));

    let err = exchange_error(client.order_book(&pair).await.unwrap_err());
    assert!(matches!(err, ExchangeError::UnknownSymbol { .. }));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn limit_buy_places_exchange_limit_order() {
    let response = r#"{"id":42,"order_id":42,"symbol":"btcusd","price":"100.0","side":"buy","type":"exchange limit","is_live":true,"is_cancelled":false}"#;
    let (shared, transport) = scripted(&[response]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(context(&shared, transport.clone()));

    let order = client.limit_buy(&pair, dec!(2), dec!(100)).await.unwrap();

    assert_eq!(order.id.as_ref().unwrap().as_str(), "42");
    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.side, OrderSide::Buy);
    assert_eq!(order.raw_response, response);

    let request = transport.last_request().unwrap();
    assert_eq!(request.url, "https://api.test/v1/order/new");
    let payload = header_payload(&request, "X-BFX-PAYLOAD");
    assert_eq!(payload["symbol"], "btcusd");
    assert_eq!(payload["type"], "exchange limit");
    assert_eq!(payload["side"], "buy");
    assert_eq!(payload["amount"], "2");
    assert_eq!(payload["request"], "/v1/order/new");
    assert!(payload.get("exchange").is_none());
    assert!(request.body.is_none());
}

#[tokio::test]
async fn placement_error_message_is_a_rejection() {
    let (shared, transport) = scripted(&[r#"{"message":"Invalid order: not enough exchange balance"}"#]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(context(&shared, transport));

    let err = exchange_error(client.limit_sell(&pair, dec!(1), dec!(100)).await.unwrap_err());
    assert!(matches!(
        err,
        ExchangeError::Rejected { operation: "LimitOrder", ref message, .. } if message.contains("balance")
    ));
}

#[tokio::test]
async fn status_poll_records_partial_fill() {
    let response = r#"{"id":42,"is_live":true,"is_cancelled":false,"original_amount":"2.0","remaining_amount":"1.5","executed_amount":"0.5","avg_execution_price":"100.2"}"#;
    let (shared, transport) = scripted(&[response]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, "42", OrderSide::Buy, dec!(100), dec!(2));

    client.order_status(&mut order).await.unwrap();

    assert_eq!(order.status, OrderStatus::Partial);
    assert_eq!(order.deal_quantity, dec!(0.5));
    assert_eq!(order.deal_rate, dec!(100.2));
    assert_eq!(order.status_message.as_deref(), Some(response));
}

#[tokio::test]
async fn status_poll_without_average_price_uses_limit_rate() {
    let response = r#"{"id":42,"is_live":false,"is_cancelled":false,"remaining_amount":"0.0","executed_amount":"2.0","avg_execution_price":"0.0"}"#;
    let (shared, transport) = scripted(&[response]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, "42", OrderSide::Sell, dec!(100), dec!(2));

    client.order_status(&mut order).await.unwrap();

    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.deal_rate, dec!(100));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (shared, transport) = scripted(&[r#"{"message":"No such order found."}"#]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, "42", OrderSide::Buy, dec!(100), dec!(2));

    let err = exchange_error(client.order_status(&mut order).await.unwrap_err());
    assert_eq!(
        err,
        ExchangeError::OrderNotFound {
            exchange: "bitfinex",
            order_id: "42".into()
        }
    );
    assert_eq!(order.status, OrderStatus::New);
}

#[tokio::test]
async fn cancel_moves_to_canceling_then_poll_confirms() {
    let ack = r#"{"id":42,"is_live":true,"is_cancelled":false,"remaining_amount":"2.0","executed_amount":"0.0"}"#;
    let confirmed = r#"{"id":42,"is_live":false,"is_cancelled":true,"remaining_amount":"2.0","executed_amount":"0.0"}"#;
    let (shared, transport) = scripted(&[ack, confirmed]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(context(&shared, transport.clone()));
    let mut order = placed_order(&pair, "42", OrderSide::Buy, dec!(100), dec!(2));

    client.cancel_order(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Canceling);
    assert_eq!(order.cancel_response.as_deref(), Some(ack));

    client.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Canceled);
    assert_eq!(transport.requests()[0].url, "https://api.test/v1/order/cancel");
}

#[tokio::test]
async fn pending_cancel_survives_live_poll_and_keeps_winning_fill() {
    let ack = r#"{"id":42,"is_live":true,"is_cancelled":false,"remaining_amount":"2.0","executed_amount":"0.0"}"#;
    let still_live = r#"{"id":42,"is_live":true,"is_cancelled":false,"remaining_amount":"2.0","executed_amount":"0.0"}"#;
    let filled = r#"{"id":42,"is_live":false,"is_cancelled":false,"remaining_amount":"0.0","executed_amount":"2.0","avg_execution_price":"99.8"}"#;
    let (shared, transport) = scripted(&[ack, still_live, filled]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, "42", OrderSide::Buy, dec!(100), dec!(2));

    client.cancel_order(&mut order).await.unwrap();
    client.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Canceling);

    client.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Other);
    assert_eq!(order.deal_quantity, dec!(2));
    assert_eq!(order.deal_rate, dec!(99.8));
    assert_eq!(order.status_message.as_deref(), Some(filled));
}

#[tokio::test]
async fn private_calls_without_credentials_send_nothing() {
    let (shared, transport) = scripted(&[]);
    let pair = list_pair(&shared, "bitfinex", "BTC", "USD", "btcusd");
    let client = BitfinexClient::new(anonymous_context(&shared, transport.clone()));
    let mut order = placed_order(&pair, "42", OrderSide::Buy, dec!(100), dec!(2));

    let err = exchange_error(client.limit_buy(&pair, dec!(1), dec!(100)).await.unwrap_err());
    assert_eq!(err, ExchangeError::MissingCredentials { exchange: "bitfinex" });
    assert!(client.order_status(&mut order).await.is_err());
    assert!(client.cancel_order(&mut order).await.is_err());
    client.update_all_balances().await;

    assert_eq!(transport.request_count(), 0);
    assert!(shared.balances.is_empty());
    assert_eq!(order.status, OrderStatus::New);
}

#[tokio::test]
async fn balances_come_from_exchange_wallet() {
    let balances = r#"[
        {"type":"exchange","currency":"btc","amount":"1.0","available":"0.75"},
        {"type":"trading","currency":"btc","amount":"5.0","available":"5.0"},
        {"type":"exchange","currency":"usd","amount":"120.5","available":"120.5"},
        {"type":"exchange","currency":"xyz","amount":"1.0","available":"1.0"}
    ]"#;
    let (shared, transport) = scripted(&[SYMBOLS, LABELS, balances]);
    let client = BitfinexClient::new(anonymous_context(&shared, transport.clone()));
    client.get_coins_data().await;
    let client = BitfinexClient::new(context(&shared, transport));

    client.update_all_balances().await;

    assert_eq!(shared.balances.get("BTC"), Some(dec!(0.75)));
    assert_eq!(shared.balances.get("USD"), Some(dec!(120.5)));
    assert_eq!(shared.balances.len(), 2);
}

#[tokio::test]
async fn malformed_balance_updates_nothing() {
    let balances = r#"[
        {"type":"exchange","currency":"usd","available":"10"},
        {"type":"exchange","currency":"btc","available":"n/a"}
    ]"#;
    let (shared, transport) = scripted(&[SYMBOLS, LABELS, balances]);
    let client = BitfinexClient::new(anonymous_context(&shared, transport.clone()));
    client.get_coins_data().await;
    let client = BitfinexClient::new(context(&shared, transport));

    client.update_all_balances().await;

    assert!(shared.balances.is_empty());
}

#[tokio::test]
async fn unsupported_operations_say_so() {
    let (shared, transport) = scripted(&[]);
    let btc = shared.registry.register_coin("BTC", "");
    let client = BitfinexClient::new(context(&shared, transport.clone()));

    assert!(!client.withdraw(&btc, dec!(1), "addr", "").await);
    let err = exchange_error(client.list_orders().await.unwrap_err());
    assert!(matches!(err, ExchangeError::Unsupported { operation: "ListOrders", .. }));
    let err = exchange_error(client.cancel_all_orders().await.unwrap_err());
    assert!(matches!(err, ExchangeError::Unsupported { .. }));
    assert_eq!(transport.request_count(), 0);
}
