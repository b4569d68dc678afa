//! Canonical orders and the order lifecycle.
//!
//! ```text
//! New ──► Partial ──► Filled
//!  │         │
//!  │         ├──────► Canceling ──► Canceled
//!  │         │             │
//!  └─────────┴──► Canceled └──────► Other
//!                 Other
//! ```
//!
//! `Filled` and `Canceled` are terminal. `Other` covers exchange states that
//! have no canonical meaning (rejected, expired, ...) and is terminal in
//! effect; it is kept apart from `Filled` and `Canceled` so that accounting
//! never mistakes it for either.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coin::Pair;
use super::error::DomainError;
use super::id::OrderId;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Lower-case wire form used by most exchanges.
    #[must_use]
    pub const fn as_wire(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("Buy"),
            Self::Sell => f.write_str("Sell"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(format!("unknown order side: {other}")),
        }
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Partial,
    Filled,
    Canceling,
    Canceled,
    Other,
}

impl OrderStatus {
    /// Whether no further transition can leave this state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Canceled | Self::Other)
    }

    /// Whether the lifecycle allows `self -> next`.
    ///
    /// Staying in the same state is always allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (New, New) | (Partial, Partial) | (Canceling, Canceling) => true,
            (Filled, Filled) | (Canceled, Canceled) | (Other, Other) => true,
            (New, Partial | Filled | Canceled | Canceling | Other) => true,
            (Partial, Filled | Canceled | Canceling | Other) => true,
            (Canceling, Canceled | Other) => true,
            _ => false,
        }
    }

    /// [`can_transition_to`](Self::can_transition_to) as a `Result`.
    pub fn check_transition(&self, next: OrderStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::IllegalTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Coarse order state as the exchange reports it, before quantities are
/// taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueState {
    /// Resting on the book.
    Live,
    /// No longer live, with no cancel flag (typically fully executed).
    Done,
    /// The exchange says a cancel is in progress.
    Cancelling,
    /// The exchange says the order was cancelled.
    Cancelled,
    /// A state the adapter does not recognise.
    Unrecognized,
}

/// What an exchange reported about an order on a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReport {
    pub state: VenueState,
    /// Quantity still open on the exchange.
    pub remaining: Decimal,
    /// Quantity executed so far.
    pub executed: Decimal,
    /// Average execution price, when the exchange supplies a non-zero one.
    pub average_rate: Option<Decimal>,
}

/// Derive the canonical status from an exchange report.
///
/// Explicit cancel flags win over the remaining-quantity heuristic. An order
/// whose remaining quantity equals the requested quantity is only `New`
/// while the exchange still reports it live.
#[must_use]
pub fn resolve_status(requested: Decimal, report: &FillReport) -> OrderStatus {
    match report.state {
        VenueState::Cancelled => OrderStatus::Canceled,
        VenueState::Cancelling => OrderStatus::Canceling,
        VenueState::Unrecognized => OrderStatus::Other,
        VenueState::Live | VenueState::Done => {
            let remaining = report.remaining;
            if remaining.is_zero() {
                OrderStatus::Filled
            } else if remaining > Decimal::ZERO && remaining < requested {
                OrderStatus::Partial
            } else if remaining == requested && report.state == VenueState::Live {
                OrderStatus::New
            } else {
                OrderStatus::Other
            }
        }
    }
}

/// A limit order placed on one exchange.
///
/// Only the adapter of the exchange that accepted the order mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Exchange-assigned id, unset until the exchange accepts the order.
    pub id: Option<OrderId>,
    pub pair: Pair,
    pub side: OrderSide,
    /// Requested limit price.
    pub rate: Decimal,
    /// Requested quantity.
    pub quantity: Decimal,
    /// Average execution price.
    pub deal_rate: Decimal,
    /// Quantity executed so far; never above `quantity`.
    pub deal_quantity: Decimal,
    pub status: OrderStatus,
    /// Raw placement response, kept for audit.
    pub raw_response: String,
    /// Raw response of the last status poll.
    pub status_message: Option<String>,
    /// Raw cancel acknowledgment.
    pub cancel_response: Option<String>,
}

impl Order {
    /// A freshly accepted order in state `New`.
    #[must_use]
    pub fn placed(
        id: OrderId,
        pair: Pair,
        side: OrderSide,
        rate: Decimal,
        quantity: Decimal,
        raw_response: String,
    ) -> Self {
        Self {
            id: Some(id),
            pair,
            side,
            rate,
            quantity,
            deal_rate: Decimal::ZERO,
            deal_quantity: Decimal::ZERO,
            status: OrderStatus::New,
            raw_response,
            status_message: None,
            cancel_response: None,
        }
    }

    /// The exchange id, or an error for orders never accepted.
    pub fn require_id(&self) -> Result<&OrderId, DomainError> {
        self.id.as_ref().ok_or(DomainError::MissingOrderId)
    }

    /// Move to `next` if the lifecycle allows it.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        self.status.check_transition(next)?;
        self.status = next;
        Ok(())
    }

    /// Apply a status poll: resolve the new state and record the fill.
    ///
    /// While a cancel is pending, a report that the order is still live
    /// keeps it `Canceling`, and a full execution that beat the cancel
    /// settles it as `Other` with the fill recorded.
    ///
    /// The order is left untouched if the report is illegal for the current
    /// state or claims more than the requested quantity executed.
    pub fn apply_report(&mut self, report: &FillReport) -> Result<OrderStatus, DomainError> {
        if report.executed > self.quantity {
            return Err(DomainError::OverFill {
                executed: report.executed,
                requested: self.quantity,
            });
        }
        let mut next = resolve_status(self.quantity, report);
        if self.status == OrderStatus::Canceling {
            next = match next {
                OrderStatus::New | OrderStatus::Partial => OrderStatus::Canceling,
                OrderStatus::Filled => OrderStatus::Other,
                settled => settled,
            };
        }
        self.transition(next)?;
        self.deal_quantity = report.executed;
        self.deal_rate = report.average_rate.unwrap_or(self.rate);
        Ok(next)
    }

    /// Record a successful cancel acknowledgment.
    ///
    /// Exchanges confirm cancellation asynchronously, so this only moves the
    /// order to `Canceling`; a later status poll observes `Canceled`.
    pub fn mark_canceling(&mut self, ack: String) -> Result<(), DomainError> {
        self.transition(OrderStatus::Canceling)?;
        self.cancel_response = Some(ack);
        Ok(())
    }
}
