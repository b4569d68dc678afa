//! Order-book snapshots ("makers").

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price level in an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    rate: Decimal,
    quantity: Decimal,
}

impl PriceLevel {
    /// Create a new price level.
    #[must_use]
    pub const fn new(rate: Decimal, quantity: Decimal) -> Self {
        Self { rate, quantity }
    }

    /// Get the price.
    #[must_use]
    pub const fn rate(&self) -> Decimal {
        self.rate
    }

    /// Get the size at this price.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }
}

/// Point-in-time order book taken from one exchange.
///
/// Levels are kept in the order the exchange sent them; exchanges
/// conventionally send best-first on both sides but nothing here checks it.
/// A `Maker` is never modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maker {
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    worker_ip: String,
}

impl Maker {
    /// Build a snapshot.
    ///
    /// `before` and `after` are the wall-clock times taken around the
    /// network call; `worker_ip` is the caller's external address, empty
    /// when unknown.
    #[must_use]
    pub fn new(
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        worker_ip: String,
    ) -> Self {
        Self {
            bids,
            asks,
            before,
            after,
            worker_ip,
        }
    }

    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    /// First bid as supplied by the exchange.
    #[must_use]
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// First ask as supplied by the exchange.
    #[must_use]
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    #[must_use]
    pub const fn before_timestamp(&self) -> DateTime<Utc> {
        self.before
    }

    #[must_use]
    pub const fn after_timestamp(&self) -> DateTime<Utc> {
        self.after
    }

    /// Time spent waiting on the exchange.
    #[must_use]
    pub fn latency(&self) -> Duration {
        self.after - self.before
    }

    #[must_use]
    pub fn worker_ip(&self) -> &str {
        &self.worker_ip
    }
}
