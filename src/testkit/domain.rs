//! Builders for shared state and domain values used across tests.
//!
//! Keeps adapter tests focused on wire behavior instead of registry and
//! constraint boilerplate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::{Order, OrderId, OrderSide, Pair, PairConstraint};
use crate::exchange::{AdapterContext, Credentials, NonceSource, Shared, SourceMode, Transport};

/// Nonces counting up from a fixed start, for reproducible signatures.
#[derive(Debug)]
pub struct SequenceNonce(AtomicU64);

impl SequenceNonce {
    pub fn starting_at(first: u64) -> Self {
        Self(AtomicU64::new(first))
    }
}

impl NonceSource for SequenceNonce {
    fn next_nonce(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// In-memory shared state whose nonces start at 1000.
pub fn shared() -> Shared {
    Shared::in_memory().with_nonce(Arc::new(SequenceNonce::starting_at(1000)))
}

pub fn credentials() -> Credentials {
    Credentials::new("test-key", "test-secret")
}

/// An exchange-API context with credentials.
pub fn context(shared: &Shared, transport: Arc<dyn Transport>) -> AdapterContext {
    AdapterContext::new(shared.clone(), transport, SourceMode::ExchangeApi)
        .with_credentials(Some(credentials()))
        .with_api_url(Some("https://api.test".into()))
}

/// Like [`context`], without credentials.
pub fn anonymous_context(shared: &Shared, transport: Arc<dyn Transport>) -> AdapterContext {
    AdapterContext::new(shared.clone(), transport, SourceMode::ExchangeApi)
        .with_api_url(Some("https://api.test".into()))
}

/// Register `base/quote` and list it on `exchange` under `ex_symbol`.
pub fn list_pair(shared: &Shared, exchange: &'static str, base: &str, quote: &str, ex_symbol: &str) -> Pair {
    let base = shared.registry.register_coin(base, "");
    let quote = shared.registry.register_coin(quote, "");
    let pair = shared.registry.register_pair(&base, &quote);
    shared.constraints.set_pair(
        exchange,
        PairConstraint {
            pair: pair.clone(),
            ex_symbol: ex_symbol.to_string(),
            maker_fee: Decimal::ZERO,
            taker_fee: Decimal::ZERO,
            lot_size: Decimal::new(1, 8),
            price_filter: Decimal::new(1, 8),
            listed: true,
        },
    );
    pair
}

/// A freshly placed order with id `id`.
pub fn placed_order(pair: &Pair, id: &str, side: OrderSide, rate: Decimal, quantity: Decimal) -> Order {
    Order::placed(OrderId::new(id), pair.clone(), side, rate, quantity, String::new())
}
