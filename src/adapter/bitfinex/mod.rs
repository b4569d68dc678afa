//! Bitfinex exchange integration.
//!
//! Private calls use the header-HMAC scheme (HMAC-SHA384 over the base64
//! payload).

mod client;
mod types;

pub use client::{BitfinexClient, SCHEME};

pub const NAME: &str = "bitfinex";
pub const API_URL: &str = "https://api.bitfinex.com";

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::CoinDefaults;

const COIN_DEFAULTS: CoinDefaults = CoinDefaults {
    tx_fee: Decimal::ZERO,
    withdraw: true,
    deposit: true,
    confirmation: 2,
};
const DEFAULT_MAKER_FEE: Decimal = dec!(0.001);
const DEFAULT_TAKER_FEE: Decimal = dec!(0.002);
const DEFAULT_LOT_SIZE: Decimal = dec!(0.00001);

/// Quote tickers tried as suffixes of `btcusd`-style symbols, in priority
/// order.
const QUOTES: &[&str] = &["usd", "eur", "gbp", "jpy", "btc", "eth", "eos", "xlm", "dai", "ust"];
