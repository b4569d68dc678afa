//! Canonical configurations and reference data for tests.

/// Two exchanges, live discovery, default network settings.
pub const TWO_EXCHANGES: &str = r#"
[logging]
level = "debug"
format = "json"

[[exchanges]]
name = "bitfinex"

[[exchanges]]
name = "kraken"
api_url = "https://kraken.test/0"
"#;

/// A snapshot listing BTC, USD and the BTC/USD pair under `btcusd`.
pub const BTC_USD_SNAPSHOT: &str = r#"{
  "coins": [
    {"code": "BTC", "name": "Bitcoin", "ex_symbol": "BTC", "tx_fee": "0.0004", "confirmation": 3},
    {"code": "USD", "name": "US Dollar", "ex_symbol": "USD", "tx_fee": "0", "confirmation": 0}
  ],
  "pairs": [
    {"base": "BTC", "quote": "USD", "ex_symbol": "btcusd",
     "maker_fee": "0.001", "taker_fee": "0.002", "lot_size": "0.00001", "price_filter": "0.1"}
  ]
}"#;

/// A `json_file` configuration pointing at `snapshot`.
pub fn json_file_config(name: &str, snapshot: &std::path::Path) -> String {
    format!(
        "[[exchanges]]\nname = \"{name}\"\nsource = \"json_file\"\nsnapshot = \"{}\"\n",
        snapshot.display()
    )
}
