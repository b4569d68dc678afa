//! Coinbridge - a uniform adapter layer over cryptocurrency exchange REST APIs.
//!
//! Every supported exchange is wrapped by an adapter that speaks one
//! canonical vocabulary: coins, pairs, order books, balances and limit
//! orders with a well-defined lifecycle. Callers hold a registry of coins
//! and pairs shared across exchanges, and per-exchange constraints (fees,
//! lot and tick sizes, listing status) recorded by each adapter.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with environment overrides for secrets
//! - [`domain`] - Exchange-agnostic types: coins, pairs, orders, books, balances
//! - [`exchange`] - The adapter contract plus transport, signing and parsing
//! - [`adapter`] - Bitfinex, Kraken and Liquid implementations
//! - [`cli`] - Command-line interface used by the `coinbridge` binary
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use coinbridge::config::Config;
//! use coinbridge::exchange::{ExchangeFactory, HttpTransport, Shared, Transport};
//!
//! # async fn run() -> coinbridge::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let transport: Arc<dyn Transport> =
//!     Arc::new(HttpTransport::new("https://api.ipify.org", Duration::from_secs(10))?);
//! let shared = Shared::in_memory();
//! for exchange in ExchangeFactory::create_all(&config, &shared, &transport)? {
//!     exchange.get_coins_data().await;
//!     exchange.get_pairs_data().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
