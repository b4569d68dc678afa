//! Exchange abstraction layer.
//!
//! Defines the contract every exchange adapter fulfils, plus the transport,
//! signing and normalisation pieces adapters are built from.

mod context;
mod factory;
pub mod normalize;
pub mod signing;
pub mod transport;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{Coin, Maker, Order, Pair};
use crate::error::Result;

pub use context::{AdapterContext, Shared, Timed};
pub use factory::ExchangeFactory;
pub use signing::{Credentials, EpochNanos, NonceSource, Signer, SigningScheme};
pub use transport::{HttpTransport, Method, Request, Transport};

/// Supported exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Bitfinex,
    Kraken,
    Liquid,
}

impl ExchangeKind {
    /// Name used in logs, constraint keys and environment variables.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bitfinex => "bitfinex",
            Self::Kraken => "kraken",
            Self::Liquid => "liquid",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitfinex" => Ok(Self::Bitfinex),
            "kraken" => Ok(Self::Kraken),
            "liquid" => Ok(Self::Liquid),
            other => Err(format!("unknown exchange: {other}")),
        }
    }
}

/// Where coin and pair discovery gets its reference data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Discover from the live exchange and register anything new.
    #[default]
    ExchangeApi,
    /// Only look up what a pre-seeded snapshot registered; never mutate
    /// the shared registry.
    JsonFile,
}

/// The operations every exchange adapter provides.
///
/// Each adapter implements every method itself; per-exchange quirks differ
/// too much for shared defaults.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Exchange name for logging and constraint keys.
    fn name(&self) -> &'static str;

    /// Reference-data mode this adapter was configured with.
    fn source(&self) -> SourceMode;

    /// Sync coins and their constraints. Best-effort: failures are logged.
    async fn get_coins_data(&self);

    /// Sync pairs and their constraints. Best-effort: failures are logged.
    async fn get_pairs_data(&self);

    /// Fetch one order-book snapshot.
    async fn order_book(&self, pair: &Pair) -> Result<Maker>;

    /// Refresh the shared balance map. Advisory: failures are logged.
    async fn update_all_balances(&self);

    /// Place a limit buy. Never retried.
    async fn limit_buy(&self, pair: &Pair, quantity: Decimal, rate: Decimal) -> Result<Order>;

    /// Place a limit sell. Never retried.
    async fn limit_sell(&self, pair: &Pair, quantity: Decimal, rate: Decimal) -> Result<Order>;

    /// Re-read `order` from the exchange and update it in place.
    async fn order_status(&self, order: &mut Order) -> Result<()>;

    /// Request cancellation; moves `order` to `Canceling` on acknowledgment.
    async fn cancel_order(&self, order: &mut Order) -> Result<()>;

    /// Withdraw funds. Returns whether the withdrawal was accepted.
    async fn withdraw(&self, coin: &Coin, quantity: Decimal, address: &str, tag: &str) -> bool;

    /// Open orders on the account.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Cancel every open order on the account.
    async fn cancel_all_orders(&self) -> Result<()>;
}
