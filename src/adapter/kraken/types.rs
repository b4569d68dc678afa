//! Kraken API response types.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::exchange::normalize::RawBook;

/// Every Kraken response: `{"error": [...], "result": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct AssetInfo {
    pub altname: String,
}

#[derive(Debug, Deserialize)]
pub struct AssetPair {
    pub base: String,
    pub quote: String,
    #[serde(default)]
    pub lot_decimals: u32,
    #[serde(default)]
    pub pair_decimals: u32,
    /// Taker fee tiers: `[[volume, percent], ...]`.
    #[serde(default)]
    pub fees: Vec<Vec<Value>>,
    #[serde(default)]
    pub fees_maker: Vec<Vec<Value>>,
}

/// Depth result, keyed by the pair symbol.
pub type Depth = HashMap<String, RawBook>;

/// Balance result: asset symbol to amount.
pub type Balances = HashMap<String, String>;

#[derive(Debug, Deserialize)]
pub struct AddOrderResult {
    #[serde(default)]
    pub txid: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderInfo {
    pub status: String,
    pub vol: String,
    pub vol_exec: String,
    /// Average execution price.
    #[serde(default)]
    pub price: String,
}

pub type QueryOrders = HashMap<String, OrderInfo>;

#[derive(Debug, Deserialize)]
pub struct CancelResult {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub pending: bool,
}
