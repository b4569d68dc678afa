//! Bitfinex API response types.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// `/v2/conf/pub:map:*` payload: one list of `[key, value]` string pairs.
pub type ConfMap = Vec<Vec<Vec<String>>>;

#[derive(Debug, Deserialize)]
pub struct AccountFees {
    #[serde(default)]
    pub withdraw: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolDetail {
    pub pair: String,
    #[serde(default)]
    pub price_precision: u32,
}

#[derive(Debug, Deserialize)]
pub struct BookEntry {
    pub price: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookEntry>,
    pub asks: Vec<BookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct Balance {
    #[serde(rename = "type")]
    pub wallet: String,
    pub currency: String,
    pub available: String,
}

/// Order placement, status and cancel responses share this shape.
#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub remaining_amount: String,
    #[serde(default)]
    pub executed_amount: String,
    #[serde(default)]
    pub avg_execution_price: String,
}

impl OrderResponse {
    /// The order id, whichever field carried it. Zero means none.
    pub fn order_id(&self) -> Option<u64> {
        self.order_id.or(self.id).filter(|id| *id != 0)
    }
}

/// Error body: `{"message": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}
