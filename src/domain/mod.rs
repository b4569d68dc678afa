//! Exchange-agnostic domain types and shared reference state.

pub mod balance;
pub mod book;
pub mod coin;
pub mod constraint;
pub mod error;
pub mod id;
pub mod order;
pub mod registry;
pub mod snapshot;
pub mod symbol;

pub use balance::BalanceMap;
pub use book::{Maker, PriceLevel};
pub use coin::{Coin, Pair};
pub use constraint::{CoinConstraint, CoinDefaults, ConstraintStore, PairConstraint};
pub use error::DomainError;
pub use id::{CoinId, OrderId, PairId};
pub use order::{resolve_status, FillReport, Order, OrderSide, OrderStatus, VenueState};
pub use registry::{MemoryRegistry, Registry};
pub use snapshot::ReferenceSnapshot;
