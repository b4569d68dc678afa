//! Liquid API response types.

use serde::Deserialize;
use serde_json::Value;

use crate::exchange::normalize::RawLevel;

#[derive(Debug, Deserialize)]
pub struct Product {
    /// Numeric id, sent as either a string or a number.
    pub id: Value,
    pub currency_pair_code: String,
    pub base_currency: String,
    pub quoted_currency: String,
    #[serde(default)]
    pub maker_fee: Value,
    #[serde(default)]
    pub taker_fee: Value,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct PriceLevels {
    pub buy_price_levels: Vec<RawLevel>,
    pub sell_price_levels: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
pub struct AccountBalance {
    pub currency: String,
    pub balance: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub filled_quantity: String,
    #[serde(default)]
    pub average_price: Value,
}
