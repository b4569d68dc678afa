//! Exchange-specific trading metadata for coins and pairs.
//!
//! One constraint exists per `(exchange, coin)` and per `(exchange, pair)`.
//! Refreshing an exchange overwrites what was there before.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coin::{Coin, Pair};
use super::id::{CoinId, PairId};

/// Per-exchange metadata for one coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinConstraint {
    pub coin: Coin,
    /// The exchange's own symbol for the coin (`XXBT` on Kraken, `BTC` elsewhere).
    pub ex_symbol: String,
    /// Withdrawal fee, in units of the coin.
    pub tx_fee: Decimal,
    pub withdraw: bool,
    pub deposit: bool,
    /// Confirmations the exchange requires before crediting a deposit.
    pub confirmation: u32,
    pub listed: bool,
}

impl CoinConstraint {
    #[must_use]
    pub fn coin_id(&self) -> CoinId {
        self.coin.id()
    }
}

/// Per-exchange metadata for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConstraint {
    pub pair: Pair,
    pub ex_symbol: String,
    /// Maker fee as a fraction (0.001 = 0.1%).
    pub maker_fee: Decimal,
    /// Taker fee as a fraction.
    pub taker_fee: Decimal,
    /// Minimum quantity increment.
    pub lot_size: Decimal,
    /// Minimum price increment.
    pub price_filter: Decimal,
    pub listed: bool,
}

impl PairConstraint {
    #[must_use]
    pub fn pair_id(&self) -> PairId {
        self.pair.id()
    }
}

/// Fee and flags for a coin an exchange lists without reporting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinDefaults {
    pub tx_fee: Decimal,
    pub withdraw: bool,
    pub deposit: bool,
    pub confirmation: u32,
}

/// Keyed store of coin and pair constraints with upsert semantics.
#[derive(Debug, Default)]
pub struct ConstraintStore {
    coins: DashMap<(&'static str, CoinId), CoinConstraint>,
    pairs: DashMap<(&'static str, PairId), PairConstraint>,
}

impl ConstraintStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the constraint for `(exchange, constraint.coin)`.
    pub fn set_coin(&self, exchange: &'static str, constraint: CoinConstraint) {
        self.coins
            .insert((exchange, constraint.coin_id()), constraint);
    }

    /// Mark `coin` as listed on `exchange` under `ex_symbol`.
    ///
    /// Fee and flags already recorded (from a snapshot or an earlier
    /// discovery) survive; `defaults` only fill a first listing.
    pub fn list_coin(&self, exchange: &'static str, coin: Coin, ex_symbol: &str, defaults: &CoinDefaults) {
        let ex_symbol = ex_symbol.to_string();
        self.coins
            .entry((exchange, coin.id()))
            .and_modify(|existing| {
                existing.ex_symbol.clone_from(&ex_symbol);
                existing.listed = true;
            })
            .or_insert_with(|| CoinConstraint {
                coin,
                ex_symbol: ex_symbol.clone(),
                tx_fee: defaults.tx_fee,
                withdraw: defaults.withdraw,
                deposit: defaults.deposit,
                confirmation: defaults.confirmation,
                listed: true,
            });
    }

    #[must_use]
    pub fn coin(&self, exchange: &'static str, coin: &Coin) -> Option<CoinConstraint> {
        self.coins
            .get(&(exchange, coin.id()))
            .map(|entry| entry.value().clone())
    }

    /// Apply `f` to an existing coin constraint. Returns false if absent.
    pub fn update_coin<F>(&self, exchange: &'static str, coin: &Coin, f: F) -> bool
    where
        F: FnOnce(&mut CoinConstraint),
    {
        match self.coins.get_mut(&(exchange, coin.id())) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// Resolve an exchange-local coin symbol back to the registry coin.
    ///
    /// Matches the exchange symbol first, then the coin code, both
    /// case-insensitively.
    #[must_use]
    pub fn coin_by_symbol(&self, exchange: &'static str, symbol: &str) -> Option<Coin> {
        let by_symbol = self
            .coins
            .iter()
            .find(|e| e.key().0 == exchange && e.ex_symbol.eq_ignore_ascii_case(symbol))
            .map(|e| e.coin.clone());
        by_symbol.or_else(|| {
            self.coins
                .iter()
                .find(|e| e.key().0 == exchange && e.coin.code().eq_ignore_ascii_case(symbol))
                .map(|e| e.coin.clone())
        })
    }

    /// Every coin constraint recorded for `exchange`.
    #[must_use]
    pub fn coins_for(&self, exchange: &'static str) -> Vec<CoinConstraint> {
        let mut out: Vec<CoinConstraint> = self
            .coins
            .iter()
            .filter(|e| e.key().0 == exchange)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(CoinConstraint::coin_id);
        out
    }

    /// Insert or replace the constraint for `(exchange, constraint.pair)`.
    pub fn set_pair(&self, exchange: &'static str, constraint: PairConstraint) {
        self.pairs
            .insert((exchange, constraint.pair_id()), constraint);
    }

    #[must_use]
    pub fn pair(&self, exchange: &'static str, pair: &Pair) -> Option<PairConstraint> {
        self.pairs
            .get(&(exchange, pair.id()))
            .map(|entry| entry.value().clone())
    }

    /// Resolve an exchange-local market symbol back to the registry pair.
    #[must_use]
    pub fn pair_by_symbol(&self, exchange: &'static str, symbol: &str) -> Option<Pair> {
        self.pairs
            .iter()
            .find(|e| e.key().0 == exchange && e.ex_symbol.eq_ignore_ascii_case(symbol))
            .map(|e| e.pair.clone())
    }

    /// The exchange-local symbol to use when requesting `pair`.
    #[must_use]
    pub fn symbol_for_pair(&self, exchange: &'static str, pair: &Pair) -> Option<String> {
        self.pairs
            .get(&(exchange, pair.id()))
            .map(|entry| entry.ex_symbol.clone())
    }

    /// Every pair constraint recorded for `exchange`.
    #[must_use]
    pub fn pairs_for(&self, exchange: &'static str) -> Vec<PairConstraint> {
        let mut out: Vec<PairConstraint> = self
            .pairs
            .iter()
            .filter(|e| e.key().0 == exchange)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(PairConstraint::pair_id);
        out
    }
}
