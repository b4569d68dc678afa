//! Exchange adapters, one per supported exchange.
//!
//! Each adapter implements [`crate::exchange::Exchange`] over the shared
//! transport and signing pieces and keeps its wire types private.

pub mod bitfinex;
pub mod kraken;
pub mod liquid;
