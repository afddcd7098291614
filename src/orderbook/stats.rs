//! Aggregate engine statistics as a pack of atomic counters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters updated on the submission and cancellation hot
/// paths. Plain atomics, no lock; readers take a point-in-time
/// [`StatsSnapshot`].
#[derive(Debug, Default)]
pub struct EngineStats {
    total_orders: AtomicU64,
    active_orders: AtomicU64,
    total_trades: AtomicU64,
    cancelled_orders: AtomicU64,
    rejected_orders: AtomicU64,
}

impl EngineStats {
    pub(super) fn record_submit(&self) {
        self.total_orders.fetch_add(1, Ordering::Relaxed);
        self.active_orders.fetch_add(1, Ordering::Relaxed);
    }

    /// One order reached `Filled` or `Cancelled`; called exactly once per
    /// terminal transition, regardless of taker/maker role.
    pub(super) fn record_terminal(&self) {
        self.active_orders.fetch_sub(1, Ordering::Relaxed);
    }

    pub(super) fn record_trade(&self) {
        self.total_trades.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_cancel(&self) {
        self.cancelled_orders.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_reject(&self) {
        self.rejected_orders.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_orders: self.total_orders.load(Ordering::Relaxed),
            active_orders: self.active_orders.load(Ordering::Relaxed),
            total_trades: self.total_trades.load(Ordering::Relaxed),
            cancelled_orders: self.cancelled_orders.load(Ordering::Relaxed),
            rejected_orders: self.rejected_orders.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of [`EngineStats`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Accepted submissions since engine creation.
    pub total_orders: u64,
    /// Orders currently `New` or `PartiallyFilled` with quantity
    /// remaining.
    pub active_orders: u64,
    /// Trades emitted across all books.
    pub total_trades: u64,
    /// Successful cancellations.
    pub cancelled_orders: u64,
    /// Submissions rejected before reaching a book.
    pub rejected_orders: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "orders={} active={} trades={} cancelled={} rejected={}",
            self.total_orders,
            self.active_orders,
            self.total_trades,
            self.cancelled_orders,
            self.rejected_orders
        )
    }
}
