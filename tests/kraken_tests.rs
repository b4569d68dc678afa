//! Kraken adapter behavior against scripted exchange responses.

mod support;

use coinbridge::adapter::kraken::KrakenClient;
use coinbridge::domain::{OrderSide, OrderStatus, ReferenceSnapshot};
use coinbridge::error::ExchangeError;
use coinbridge::exchange::{AdapterContext, Exchange, Method, SourceMode};
use coinbridge::testkit::domain::{anonymous_context, context, list_pair, placed_order};
use rust_decimal_macros::dec;

use support::adapter::{exchange_error, scripted};

const ASSETS: &str = r#"{"error":[],"result":{
    "XXBT":{"aclass":"currency","altname":"XBT","decimals":10},
    "ZUSD":{"aclass":"currency","altname":"USD","decimals":4}
}}"#;

const ASSET_PAIRS: &str = r#"{"error":[],"result":{
    "XXBTZUSD":{"altname":"XBTUSD","base":"XXBT","quote":"ZUSD","lot_decimals":8,"pair_decimals":1,
        "fees":[[0,0.26],[50000,0.24]],"fees_maker":[[0,0.16],[50000,0.14]]},
    "XXBTZUSD.d":{"altname":"XBTUSD.d","base":"XXBT","quote":"ZUSD","lot_decimals":8,"pair_decimals":1},
    "XETHZUSD":{"altname":"ETHUSD","base":"XETH","quote":"ZUSD","lot_decimals":8,"pair_decimals":2}
}}"#;

const TXID: &str = "OABC12-DEF34-GHI56";

#[tokio::test]
async fn discovery_lists_assets_and_converts_percent_fees() {
    let (shared, transport) = scripted(&[ASSETS, ASSET_PAIRS]);
    let client = KrakenClient::new(anonymous_context(&shared, transport.clone()));

    client.get_coins_data().await;
    client.get_pairs_data().await;

    let xbt = shared.registry.lookup_coin("XBT").unwrap();
    let coin = shared.constraints.coin("kraken", &xbt).unwrap();
    assert_eq!(coin.ex_symbol, "XXBT");
    assert_eq!(coin.confirmation, 6);

    let pairs = shared.constraints.pairs_for("kraken");
    assert_eq!(pairs.len(), 1);
    let pair = &pairs[0];
    assert_eq!(pair.ex_symbol, "XXBTZUSD");
    assert_eq!(pair.pair.to_string(), "XBT/USD");
    assert_eq!(pair.maker_fee, dec!(0.0016));
    assert_eq!(pair.taker_fee, dec!(0.0026));
    assert_eq!(pair.lot_size, dec!(0.00000001));
    assert_eq!(pair.price_filter, dec!(0.1));

    assert_eq!(transport.requests()[1].url, "https://api.test/public/AssetPairs");
}

#[tokio::test]
async fn envelope_error_aborts_discovery() {
    let (shared, transport) = scripted(&[r#"{"error":["EService:Unavailable"]}"#]);
    let client = KrakenClient::new(anonymous_context(&shared, transport));

    client.get_coins_data().await;

    assert!(shared.constraints.coins_for("kraken").is_empty());
}

#[tokio::test]
async fn json_file_mode_only_updates_seeded_entries() {
    let snapshot = ReferenceSnapshot::from_json(
        r#"{
        "coins": [
            {"code": "BTC", "ex_symbol": "XXBT", "tx_fee": "0.0005", "confirmation": 3},
            {"code": "USD", "ex_symbol": "ZUSD"}
        ],
        "pairs": [
            {"base": "BTC", "quote": "USD", "ex_symbol": "XXBTZUSD",
             "maker_fee": "0.001", "taker_fee": "0.002", "lot_size": "0.0001", "price_filter": "1"}
        ]
    }"#,
    )
    .unwrap();
    let (shared, transport) = scripted(&[ASSETS, ASSET_PAIRS]);
    snapshot.seed("kraken", shared.registry.as_ref(), &shared.constraints);
    let ctx = AdapterContext::new(shared.clone(), transport, SourceMode::JsonFile)
        .with_api_url(Some("https://api.test".into()));
    let client = KrakenClient::new(ctx);

    client.get_coins_data().await;
    client.get_pairs_data().await;

    assert_eq!(shared.registry.coins().len(), 2);
    assert!(shared.registry.lookup_coin("XBT").is_none());
    assert!(shared.registry.lookup_coin("XETH").is_none());

    let btc = shared.registry.lookup_coin("BTC").unwrap();
    let coin = shared.constraints.coin("kraken", &btc).unwrap();
    assert_eq!(coin.tx_fee, dec!(0.0005));
    assert_eq!(coin.confirmation, 3);

    let pairs = shared.constraints.pairs_for("kraken");
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].pair.to_string(), "BTC/USD");
    assert_eq!(pairs[0].price_filter, dec!(0.1));
}

#[tokio::test]
async fn order_book_reads_the_single_result_entry() {
    let depth = r#"{"error":[],"result":{"XXBTZUSD":{
        "asks":[["101.0","1.5",1600000000],["101.5","3.0",1600000001]],
        "bids":[["100.0","2.0",1600000000]]
    }}}"#;
    let (shared, transport) = scripted(&[depth]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(anonymous_context(&shared, transport.clone()));

    let maker = client.order_book(&pair).await.unwrap();

    assert_eq!(maker.asks().len(), 2);
    assert_eq!(maker.best_ask().unwrap().rate(), dec!(101.0));
    assert_eq!(maker.best_bid().unwrap().quantity(), dec!(2.0));
    assert_eq!(maker.worker_ip(), "");
    assert_eq!(
        transport.last_request().unwrap().url,
        "https://api.test/public/Depth?pair=XXBTZUSD&count=100"
    );
}

#[tokio::test]
async fn order_book_with_short_level_fails() {
    let depth = r#"{"error":[],"result":{"XXBTZUSD":{"asks":[["101.0"]],"bids":[]}}}"#;
    let (shared, transport) = scripted(&[depth]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(anonymous_context(&shared, transport));

    let err = exchange_error(client.order_book(&pair).await.unwrap_err());
    assert!(matches!(err, ExchangeError::InvalidNumber { field: "quantity", .. }));
}

#[tokio::test]
async fn order_book_without_depth_entry_fails() {
    let (shared, transport) = scripted(&[r#"{"error":[],"result":{}}"#]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(anonymous_context(&shared, transport));

    let err = exchange_error(client.order_book(&pair).await.unwrap_err());
    assert!(matches!(err, ExchangeError::Malformed { operation: "OrderBook", .. }));
}

#[tokio::test]
async fn limit_sell_signs_query_and_returns_txid() {
    let response = format!(
        r#"{{"error":[],"result":{{"descr":{{"order":"sell 1.25 XBTUSD @ limit 100.5"}},"txid":["{TXID}"]}}}}"#
    );
    let (shared, transport) = scripted(&[&response]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport.clone()));

    let order = client.limit_sell(&pair, dec!(1.25), dec!(100.5)).await.unwrap();

    assert_eq!(order.id.as_ref().unwrap().as_str(), TXID);
    assert_eq!(order.side, OrderSide::Sell);
    assert_eq!(order.status, OrderStatus::New);

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, Method::Get);
    assert!(request.url.starts_with("https://api.test/private/AddOrder?"));
    assert!(request.url.contains("type=sell"));
    assert!(request.url.contains("ordertype=limit"));
    assert!(request.url.contains("pair=XXBTZUSD"));
    assert!(request.url.contains("apikey=test-key"));
    assert!(request.url.contains("nonce=1000"));
    assert_eq!(request.header_value("apisign").map(str::len), Some(128));
}

#[tokio::test]
async fn placement_error_is_a_rejection() {
    let (shared, transport) = scripted(&[r#"{"error":["EOrder:Insufficient funds"]}"#]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport));

    let err = exchange_error(client.limit_buy(&pair, dec!(1), dec!(100)).await.unwrap_err());
    assert_eq!(
        err,
        ExchangeError::Rejected {
            exchange: "kraken",
            operation: "LimitOrder",
            message: "EOrder:Insufficient funds".into(),
        }
    );
}

#[tokio::test]
async fn status_poll_derives_remaining_from_volumes() {
    let response = format!(
        r#"{{"error":[],"result":{{"{TXID}":{{"status":"open","vol":"2.00000000","vol_exec":"0.50000000","price":"100.1"}}}}}}"#
    );
    let (shared, transport) = scripted(&[&response]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, TXID, OrderSide::Buy, dec!(100), dec!(2));

    client.order_status(&mut order).await.unwrap();

    assert_eq!(order.status, OrderStatus::Partial);
    assert_eq!(order.deal_quantity, dec!(0.5));
    assert_eq!(order.deal_rate, dec!(100.1));
    assert_eq!(order.status_message.as_deref(), Some(response.as_str()));
}

#[tokio::test]
async fn expired_order_resolves_to_other() {
    let response = format!(
        r#"{{"error":[],"result":{{"{TXID}":{{"status":"expired","vol":"2.0","vol_exec":"0.0","price":"0"}}}}}}"#
    );
    let (shared, transport) = scripted(&[&response]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, TXID, OrderSide::Buy, dec!(100), dec!(2));

    client.order_status(&mut order).await.unwrap();

    assert_eq!(order.status, OrderStatus::Other);
}

#[tokio::test]
async fn unknown_or_missing_order_is_not_found() {
    let (shared, transport) = scripted(&[
        r#"{"error":["EOrder:Unknown order"]}"#,
        r#"{"error":[],"result":{}}"#,
    ]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, TXID, OrderSide::Buy, dec!(100), dec!(2));

    for _ in 0..2 {
        let err = exchange_error(client.order_status(&mut order).await.unwrap_err());
        assert!(matches!(err, ExchangeError::OrderNotFound { ref order_id, .. } if order_id == TXID));
    }
    assert_eq!(order.status, OrderStatus::New);
}

#[tokio::test]
async fn cancel_then_poll_reaches_canceled() {
    let ack = r#"{"error":[],"result":{"count":1}}"#;
    let closed = format!(
        r#"{{"error":[],"result":{{"{TXID}":{{"status":"canceled","vol":"2.0","vol_exec":"0.5","price":"100.0"}}}}}}"#
    );
    let (shared, transport) = scripted(&[ack, &closed]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport.clone()));
    let mut order = placed_order(&pair, TXID, OrderSide::Buy, dec!(100), dec!(2));

    client.cancel_order(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Canceling);
    assert!(transport.requests()[0].url.contains(&format!("txid={TXID}")));

    client.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Canceled);
    assert_eq!(order.deal_quantity, dec!(0.5));
}

#[tokio::test]
async fn pending_cancel_records_fills_until_the_order_closes() {
    let ack = r#"{"error":[],"result":{"count":1}}"#;
    let partly = format!(
        r#"{{"error":[],"result":{{"{TXID}":{{"status":"open","vol":"2.0","vol_exec":"0.5","price":"100.0"}}}}}}"#
    );
    let closed = format!(
        r#"{{"error":[],"result":{{"{TXID}":{{"status":"closed","vol":"2.0","vol_exec":"2.0","price":"99.9"}}}}}}"#
    );
    let (shared, transport) = scripted(&[ack, &partly, &closed]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, TXID, OrderSide::Sell, dec!(100), dec!(2));

    client.cancel_order(&mut order).await.unwrap();
    client.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Canceling);
    assert_eq!(order.deal_quantity, dec!(0.5));

    client.order_status(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Other);
    assert_eq!(order.deal_quantity, dec!(2));
    assert_eq!(order.deal_rate, dec!(99.9));
}

#[tokio::test]
async fn cancel_that_cancels_nothing_is_rejected() {
    let (shared, transport) = scripted(&[r#"{"error":[],"result":{"count":0}}"#]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(context(&shared, transport));
    let mut order = placed_order(&pair, TXID, OrderSide::Buy, dec!(100), dec!(2));

    let err = exchange_error(client.cancel_order(&mut order).await.unwrap_err());
    assert!(matches!(err, ExchangeError::Rejected { operation: "CancelOrder", .. }));
    assert_eq!(order.status, OrderStatus::New);
    assert!(order.cancel_response.is_none());
}

#[tokio::test]
async fn balances_resolve_exchange_asset_keys() {
    let balances = r#"{"error":[],"result":{"XXBT":"0.5000000000","ZUSD":"100.0000","KFEE":"1000"}}"#;
    let (shared, transport) = scripted(&[ASSETS, balances]);
    let client = KrakenClient::new(context(&shared, transport));
    client.get_coins_data().await;

    client.update_all_balances().await;

    assert_eq!(shared.balances.get("XBT"), Some(dec!(0.5)));
    assert_eq!(shared.balances.get("USD"), Some(dec!(100)));
    assert_eq!(shared.balances.len(), 2);
}

#[tokio::test]
async fn private_calls_without_credentials_send_nothing() {
    let (shared, transport) = scripted(&[]);
    let pair = list_pair(&shared, "kraken", "BTC", "USD", "XXBTZUSD");
    let client = KrakenClient::new(anonymous_context(&shared, transport.clone()));
    let mut order = placed_order(&pair, TXID, OrderSide::Buy, dec!(100), dec!(2));

    let err = exchange_error(client.limit_buy(&pair, dec!(1), dec!(100)).await.unwrap_err());
    assert_eq!(err, ExchangeError::MissingCredentials { exchange: "kraken" });
    let err = exchange_error(client.cancel_order(&mut order).await.unwrap_err());
    assert_eq!(err, ExchangeError::MissingCredentials { exchange: "kraken" });
    client.update_all_balances().await;

    assert_eq!(transport.request_count(), 0);
}
