//! Trade value type and the observer callback installed for egress.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// An immutable record of a single match between a taker and a maker.
///
/// The execution price is always the maker's resting price. Trade ids are
/// allocated per book and strictly increase in emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Per-book monotonically increasing identifier.
    pub trade_id: u64,
    /// The aggressing (incoming) order.
    pub taker_order_id: u64,
    /// The resting order that provided liquidity.
    pub maker_order_id: u64,
    /// Client that owned the taker order at match time.
    pub taker_client_id: u64,
    /// Client that owned the maker order at match time.
    pub maker_client_id: u64,
    /// Symbol of the book that produced this trade.
    pub symbol: String,
    /// Execution price in minor currency units (the maker's price).
    pub price: u128,
    /// Matched quantity, always positive.
    pub quantity: u64,
    /// Emission time, microseconds since epoch.
    pub timestamp: u64,
}

impl Trade {
    /// Price × quantity.
    pub fn notional(&self) -> u128 {
        self.price.saturating_mul(self.quantity as u128)
    }

    /// Whether either side of the trade is the given order.
    pub fn involves_order(&self, order_id: u64) -> bool {
        self.taker_order_id == order_id || self.maker_order_id == order_id
    }

    /// Whether either side of the trade belongs to the given client.
    pub fn involves_client(&self, client_id: u64) -> bool {
        self.taker_client_id == client_id || self.maker_client_id == client_id
    }

    /// Client id for the requested role.
    pub fn client_for(&self, taker: bool) -> u64 {
        if taker {
            self.taker_client_id
        } else {
            self.maker_client_id
        }
    }

    /// Order id for the requested role.
    pub fn order_for(&self, taker: bool) -> u64 {
        if taker {
            self.taker_order_id
        } else {
            self.maker_order_id
        }
    }
}

/// Trades are equal when their book-local ids and symbols are equal.
impl PartialEq for Trade {
    fn eq(&self, other: &Self) -> bool {
        self.trade_id == other.trade_id && self.symbol == other.symbol
    }
}

impl Eq for Trade {}

/// Trades order by id; within one book this is emission order.
impl PartialOrd for Trade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Trade {
    fn cmp(&self, other: &Self) -> Ordering {
        self.trade_id.cmp(&other.trade_id)
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade{{id={}, symbol={}, price={}, qty={}, taker={}, maker={}}}",
            self.trade_id,
            self.symbol,
            self.price,
            self.quantity,
            self.taker_order_id,
            self.maker_order_id
        )
    }
}

/// Observer callback invoked synchronously once per emitted trade.
///
/// The callback runs on the submitting thread after the book lock has been
/// released. See [`crate::MatchingEngine::set_trade_observer`] for the full
/// contract.
pub type TradeObserver = Arc<dyn Fn(&Trade) + Send + Sync>;
