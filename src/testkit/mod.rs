//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`] - [`ScriptedTransport`](transport::ScriptedTransport),
//!   replaying canned bodies and recording every request it is handed.
//! - [`domain`] - Builders for shared state, listed pairs and orders.
//! - [`config`] - Canonical TOML configurations and reference snapshots.

pub mod config;
pub mod domain;
pub mod transport;
