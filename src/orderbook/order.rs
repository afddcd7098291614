//! Order entity: identity, lifecycle state, and derived accessors.

use crate::utils::current_time_micros;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The side of an order or a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Bid side; matches against resting asks.
    Buy,
    /// Ask side; matches against resting bids.
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of an order.
///
/// Transitions form a DAG: `New` → `PartiallyFilled` → `Filled`, with
/// `Cancelled` reachable from either live state and `Rejected` assigned
/// before an order ever enters a book. `Filled`, `Cancelled` and
/// `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, no fills yet.
    New,
    /// At least one fill, quantity remaining.
    PartiallyFilled,
    /// Fully executed.
    Filled,
    /// Cancelled by the owner; completed fills stand.
    Cancelled,
    /// Rejected before reaching a book.
    Rejected,
}

impl OrderStatus {
    /// Whether this status admits no further transitions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

/// A single client intent to buy or sell at a limit price.
///
/// Identity fields are immutable after construction; only
/// `filled_quantity`, `status` and `updated_at` change over the order's
/// life. Prices are integers in minor currency units so that priority
/// comparisons and level aggregation are exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Globally unique, engine-assigned, monotonically increasing.
    pub order_id: u64,
    /// Opaque caller identifier, copied verbatim.
    pub client_id: u64,
    /// Book partition key.
    pub symbol: String,
    /// Buy or sell. Immutable.
    pub side: Side,
    /// Limit price in minor currency units. Immutable.
    pub price: u128,
    /// Original quantity. Immutable, non-zero.
    pub quantity: u64,
    /// Cumulative executed quantity, never exceeds `quantity`.
    pub filled_quantity: u64,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Creation time, microseconds since epoch. Observability only.
    pub created_at: u64,
    /// Last state change, microseconds since epoch. Observability only.
    pub updated_at: u64,
}

impl Order {
    /// Creates a new order in `New` status with nothing filled.
    ///
    /// Quantity validation happens upstream in the engine; the book only
    /// ever sees orders with `quantity > 0`.
    pub fn new(
        order_id: u64,
        client_id: u64,
        symbol: impl Into<String>,
        side: Side,
        price: u128,
        quantity: u64,
    ) -> Self {
        let now = current_time_micros();
        Self {
            order_id,
            client_id,
            symbol: symbol.into(),
            side,
            price,
            quantity,
            filled_quantity: 0,
            status: OrderStatus::New,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity still open for execution.
    #[inline]
    pub fn remaining_quantity(&self) -> u64 {
        self.quantity - self.filled_quantity
    }

    /// Whether the order has been fully executed.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// Whether the order is live and has quantity remaining.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::New | OrderStatus::PartiallyFilled
        ) && self.remaining_quantity() > 0
    }

    #[inline]
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    #[inline]
    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    /// Applies a fill of up to `fill_quantity`, saturating at the
    /// remaining quantity. Transitions status to `Filled` when complete,
    /// `PartiallyFilled` otherwise. A fill against a terminal order is a
    /// no-op.
    pub fn fill(&mut self, fill_quantity: u64) {
        if self.status.is_terminal() {
            return;
        }

        let applied = fill_quantity.min(self.remaining_quantity());
        self.filled_quantity += applied;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.filled_quantity > 0 {
            self.status = OrderStatus::PartiallyFilled;
        }

        self.touch();
    }

    /// Marks the order cancelled. Completed fills are untouched, and the
    /// transition is idempotent: cancelling a terminal order changes
    /// nothing.
    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = OrderStatus::Cancelled;
        self.touch();
    }

    /// Marks the order rejected. Only meaningful before the order reaches
    /// a book.
    pub fn reject(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = OrderStatus::Rejected;
        self.touch();
    }

    /// Executed fraction of the original quantity, in percent.
    pub fn fill_percentage(&self) -> f64 {
        if self.quantity == 0 {
            return 0.0;
        }
        (self.filled_quantity as f64 / self.quantity as f64) * 100.0
    }

    /// Price × original quantity.
    pub fn notional(&self) -> u128 {
        self.price.saturating_mul(self.quantity as u128)
    }

    /// Price × filled quantity.
    pub fn filled_notional(&self) -> u128 {
        self.price.saturating_mul(self.filled_quantity as u128)
    }

    /// Price × remaining quantity.
    pub fn remaining_notional(&self) -> u128 {
        self.price.saturating_mul(self.remaining_quantity() as u128)
    }

    /// Age of the order in microseconds.
    pub fn age_micros(&self) -> u64 {
        current_time_micros().saturating_sub(self.created_at)
    }

    /// Whether this order could execute against `other`: same symbol,
    /// opposite sides, both active, and prices crossing.
    pub fn can_match_with(&self, other: &Order) -> bool {
        if self.symbol != other.symbol || self.side == other.side {
            return false;
        }
        if !self.is_active() || !other.is_active() {
            return false;
        }
        match self.side {
            Side::Buy => self.price >= other.price,
            Side::Sell => self.price <= other.price,
        }
    }

    fn touch(&mut self) {
        self.updated_at = current_time_micros();
    }
}

/// Orders are equal when their engine-assigned ids are equal.
impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.order_id == other.order_id
    }
}

impl Eq for Order {}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order{{id={}, client={}, symbol={}, side={}, price={}, qty={}, filled={}, status={}}}",
            self.order_id,
            self.client_id,
            self.symbol,
            self.side,
            self.price,
            self.quantity,
            self.filled_quantity,
            self.status
        )
    }
}
