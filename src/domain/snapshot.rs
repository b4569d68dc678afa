//! Offline reference data for `json_file` mode.
//!
//! A snapshot is a JSON document listing the coins and pairs one exchange
//! trades, with their constraints. Loading it at startup seeds the registry
//! and constraint store; from then on adapters only look things up.
//!
//! ```json
//! {
//!   "coins": [{ "code": "BTC", "ex_symbol": "XXBT", "tx_fee": "0.0005" }],
//!   "pairs": [{ "base": "BTC", "quote": "USD", "ex_symbol": "XXBTZUSD" }]
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::constraint::{CoinConstraint, ConstraintStore, PairConstraint};
use super::registry::Registry;
use crate::error::Result;

const fn default_true() -> bool {
    true
}

/// One coin row of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinEntry {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub ex_symbol: String,
    #[serde(default)]
    pub tx_fee: Decimal,
    #[serde(default = "default_true")]
    pub withdraw: bool,
    #[serde(default = "default_true")]
    pub deposit: bool,
    #[serde(default)]
    pub confirmation: u32,
    #[serde(default = "default_true")]
    pub listed: bool,
}

/// One pair row of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairEntry {
    pub base: String,
    pub quote: String,
    pub ex_symbol: String,
    #[serde(default)]
    pub maker_fee: Decimal,
    #[serde(default)]
    pub taker_fee: Decimal,
    #[serde(default)]
    pub lot_size: Decimal,
    #[serde(default)]
    pub price_filter: Decimal,
    #[serde(default = "default_true")]
    pub listed: bool,
}

/// Reference data for one exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    #[serde(default)]
    pub coins: Vec<CoinEntry>,
    #[serde(default)]
    pub pairs: Vec<PairEntry>,
}

impl ReferenceSnapshot {
    /// Read a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Register every coin and pair and write their constraints for
    /// `exchange`. Returns `(coins, pairs)` written.
    pub fn seed(
        &self,
        exchange: &'static str,
        registry: &dyn Registry,
        constraints: &ConstraintStore,
    ) -> (usize, usize) {
        for entry in &self.coins {
            let coin = registry.register_coin(&entry.code, &entry.name);
            constraints.set_coin(
                exchange,
                CoinConstraint {
                    coin,
                    ex_symbol: entry.ex_symbol.clone(),
                    tx_fee: entry.tx_fee,
                    withdraw: entry.withdraw,
                    deposit: entry.deposit,
                    confirmation: entry.confirmation,
                    listed: entry.listed,
                },
            );
        }

        let mut pairs = 0;
        for entry in &self.pairs {
            let base = registry.register_coin(&entry.base, "");
            let quote = registry.register_coin(&entry.quote, "");
            let pair = registry.register_pair(&base, &quote);
            constraints.set_pair(
                exchange,
                PairConstraint {
                    pair,
                    ex_symbol: entry.ex_symbol.clone(),
                    maker_fee: entry.maker_fee,
                    taker_fee: entry.taker_fee,
                    lot_size: entry.lot_size,
                    price_filter: entry.price_filter,
                    listed: entry.listed,
                },
            );
            pairs += 1;
        }

        debug!(exchange, coins = self.coins.len(), pairs, "Seeded reference snapshot");
        (self.coins.len(), pairs)
    }
}
