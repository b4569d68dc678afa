//! Reference data registry for coins and pairs.
//!
//! The registry is shared by every adapter in the process. Adapters read it
//! and, in `exchange_api` mode, register what they discover; they never own
//! it. Registration is lookup-or-create: a coin code or `(base, quote)`
//! tuple is only ever mapped to one identity.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::coin::{normalize_code, Coin, Pair};
use super::id::{CoinId, PairId};

/// Lookup and registration of coins and pairs.
pub trait Registry: Send + Sync {
    /// Find a coin by ticker code (case-insensitive).
    fn lookup_coin(&self, code: &str) -> Option<Coin>;

    /// Return the coin registered under `code`, creating it if absent.
    ///
    /// `name` is only used when the coin is created.
    fn register_coin(&self, code: &str, name: &str) -> Coin;

    /// Find a pair by its ordered `(base, quote)` tuple.
    fn lookup_pair(&self, base: &Coin, quote: &Coin) -> Option<Pair>;

    /// Return the pair for `(base, quote)`, creating it if absent.
    fn register_pair(&self, base: &Coin, quote: &Coin) -> Pair;

    /// Every registered coin.
    fn coins(&self) -> Vec<Coin>;

    /// Every registered pair.
    fn pairs(&self) -> Vec<Pair>;
}

#[derive(Debug, Default)]
struct Inner {
    coins: HashMap<String, Coin>,
    pairs: HashMap<(CoinId, CoinId), Pair>,
    next_coin: u64,
    next_pair: u64,
}

/// In-process registry guarded by a single reader-writer lock.
///
/// Lookups take the read lock; registration re-checks under the write lock
/// so two adapters racing to register the same code get the same coin.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    inner: RwLock<Inner>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered coins.
    #[must_use]
    pub fn coin_count(&self) -> usize {
        self.inner.read().coins.len()
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.inner.read().pairs.len()
    }
}

impl Registry for MemoryRegistry {
    fn lookup_coin(&self, code: &str) -> Option<Coin> {
        self.inner.read().coins.get(&normalize_code(code)).cloned()
    }

    fn register_coin(&self, code: &str, name: &str) -> Coin {
        let key = normalize_code(code);
        if let Some(coin) = self.inner.read().coins.get(&key) {
            return coin.clone();
        }

        let mut inner = self.inner.write();
        if let Some(coin) = inner.coins.get(&key) {
            return coin.clone();
        }
        inner.next_coin += 1;
        let coin = Coin::new(CoinId::new(inner.next_coin), &key, name);
        inner.coins.insert(key, coin.clone());
        coin
    }

    fn lookup_pair(&self, base: &Coin, quote: &Coin) -> Option<Pair> {
        self.inner.read().pairs.get(&(base.id(), quote.id())).cloned()
    }

    fn register_pair(&self, base: &Coin, quote: &Coin) -> Pair {
        let key = (base.id(), quote.id());
        if let Some(pair) = self.inner.read().pairs.get(&key) {
            return pair.clone();
        }

        let mut inner = self.inner.write();
        if let Some(pair) = inner.pairs.get(&key) {
            return pair.clone();
        }
        inner.next_pair += 1;
        let pair = Pair::new(PairId::new(inner.next_pair), base.clone(), quote.clone());
        inner.pairs.insert(key, pair.clone());
        pair
    }

    fn coins(&self) -> Vec<Coin> {
        let mut coins: Vec<Coin> = self.inner.read().coins.values().cloned().collect();
        coins.sort_by_key(Coin::id);
        coins
    }

    fn pairs(&self) -> Vec<Pair> {
        let mut pairs: Vec<Pair> = self.inner.read().pairs.values().cloned().collect();
        pairs.sort_by_key(Pair::id);
        pairs
    }
}
