//! Coins and trading pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{CoinId, PairId};

/// Normalise a ticker into the registry's natural-key form.
///
/// Exchanges disagree on casing (`btc`, `BTC`); the registry does not.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// A single tradable asset, identified by its ticker code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    id: CoinId,
    code: String,
    name: String,
}

impl Coin {
    /// Create a coin. The code is normalised to upper case.
    pub fn new(id: CoinId, code: &str, name: impl Into<String>) -> Self {
        Self {
            id,
            code: normalize_code(code),
            name: name.into(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> CoinId {
        self.id
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// A market trading `base` priced in `quote`.
///
/// Identity is the ordered `(base, quote)` tuple; `BTC/USD` and `USD/BTC`
/// are different pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    id: PairId,
    base: Coin,
    quote: Coin,
}

impl Pair {
    #[must_use]
    pub fn new(id: PairId, base: Coin, quote: Coin) -> Self {
        Self { id, base, quote }
    }

    #[must_use]
    pub const fn id(&self) -> PairId {
        self.id
    }

    /// The coin being bought or sold.
    #[must_use]
    pub fn base(&self) -> &Coin {
        &self.base
    }

    /// The coin prices are quoted in.
    #[must_use]
    pub fn quote(&self) -> &Coin {
        &self.quote
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
