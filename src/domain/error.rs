//! Domain validation errors for the canonical trading types.
//!
//! These errors are returned when an exchange reports something that would
//! break an invariant of [`Order`](super::order::Order).
//!
//! # Examples
//!
//! ```
//! use coinbridge::domain::error::DomainError;
//! use coinbridge::domain::order::OrderStatus;
//!
//! let err = OrderStatus::Filled.check_transition(OrderStatus::New);
//! assert!(matches!(err, Err(DomainError::IllegalTransition { .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use super::order::OrderStatus;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The order lifecycle does not allow moving between these states.
    #[error("illegal order transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// State the order was in.
        from: OrderStatus,
        /// State the exchange reported.
        to: OrderStatus,
    },

    /// Executed quantity may never exceed the requested quantity.
    #[error("executed quantity {executed} exceeds requested {requested}")]
    OverFill {
        /// Quantity the exchange reported as executed.
        executed: Decimal,
        /// Quantity originally requested.
        requested: Decimal,
    },

    /// The operation needs an exchange-assigned order id.
    #[error("order has no exchange-assigned id")]
    MissingOrderId,
}
