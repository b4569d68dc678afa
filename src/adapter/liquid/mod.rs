//! Liquid exchange integration.
//!
//! Private calls carry a JWT-style token signed with HMAC-SHA256 in the
//! `X-Quoine-Auth` header.

mod client;
mod types;

pub use client::{LiquidClient, SCHEME};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::CoinDefaults;

pub const NAME: &str = "liquid";
pub const API_URL: &str = "https://api.liquid.com";

const COIN_DEFAULTS: CoinDefaults = CoinDefaults {
    tx_fee: Decimal::ZERO,
    withdraw: true,
    deposit: true,
    confirmation: 2,
};
const DEFAULT_LOT_SIZE: Decimal = dec!(0.00000001);
const DEFAULT_PRICE_FILTER: Decimal = dec!(0.00000001);
