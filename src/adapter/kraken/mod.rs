//! Kraken exchange integration.
//!
//! Private calls use the query-HMAC scheme: key and nonce in the query
//! string, HMAC-SHA512 of the full URL in the `apisign` header.

mod client;
mod types;

pub use client::{KrakenClient, SCHEME};

pub const NAME: &str = "kraken";
pub const API_URL: &str = "https://api.kraken.com/0";

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::CoinDefaults;

const COIN_DEFAULTS: CoinDefaults = CoinDefaults {
    tx_fee: Decimal::ZERO,
    withdraw: true,
    deposit: true,
    confirmation: 6,
};
const DEFAULT_LISTED: bool = true;
/// Fallbacks when a pair reports no fee tiers.
const DEFAULT_MAKER_FEE: Decimal = dec!(0.0016);
const DEFAULT_TAKER_FEE: Decimal = dec!(0.0026);

/// Levels requested per side on an order book call.
const DEPTH_COUNT: &str = "100";
