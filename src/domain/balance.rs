//! Free balances keyed by coin code.

use std::collections::BTreeMap;

use dashmap::DashMap;
use rust_decimal::Decimal;

use super::coin::normalize_code;

/// Concurrency-safe map from coin code to free (available) quantity.
///
/// Written by balance refreshes, read by anyone. Each entry is replaced
/// whole, so readers never see a half-written value. No history is kept.
#[derive(Debug, Default)]
pub struct BalanceMap {
    inner: DashMap<String, Decimal>,
}

impl BalanceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, code: &str, free: Decimal) {
        self.inner.insert(normalize_code(code), free);
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<Decimal> {
        self.inner.get(&normalize_code(code)).map(|v| *v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy of every entry, sorted by code.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Decimal> {
        self.inner
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}
