//! Order book snapshot for market data

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Aggregation of all resting orders at one price on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price of the level in minor currency units.
    pub price: u128,
    /// Total remaining quantity across all orders at this price.
    pub quantity: u64,
    /// Number of resting orders at this price.
    pub order_count: u32,
}

/// A snapshot of the order book state at a specific point in time.
///
/// Levels are sorted best-first: bids descending by price, asks ascending.
/// The snapshot is a detached market-data view; it never feeds back into
/// the book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// The symbol or identifier for this order book
    pub symbol: String,

    /// Timestamp when the snapshot was created (microseconds since epoch)
    pub timestamp: u64,

    /// Snapshot of bid price levels, best (highest) first
    pub bids: Vec<BookLevel>,

    /// Snapshot of ask price levels, best (lowest) first
    pub asks: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    /// Get the best bid price and quantity
    pub fn best_bid(&self) -> Option<(u128, u64)> {
        let bid = self.bids.first().map(|level| (level.price, level.quantity));
        trace!("best_bid: {:?}", bid);
        bid
    }

    /// Get the best ask price and quantity
    pub fn best_ask(&self) -> Option<(u128, u64)> {
        let ask = self.asks.first().map(|level| (level.price, level.quantity));
        trace!("best_ask: {:?}", ask);
        ask
    }

    /// Get the mid price (average of best bid and best ask)
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid_price, _)), Some((ask_price, _))) => {
                Some((bid_price as f64 + ask_price as f64) / 2.0)
            }
            _ => None,
        }
    }

    /// Get the spread (best ask - best bid)
    pub fn spread(&self) -> Option<u128> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid_price, _)), Some((ask_price, _))) => {
                Some(ask_price.saturating_sub(bid_price))
            }
            _ => None,
        }
    }

    /// Calculate the total volume on the bid side
    pub fn total_bid_volume(&self) -> u64 {
        self.bids.iter().map(|level| level.quantity).sum()
    }

    /// Calculate the total volume on the ask side
    pub fn total_ask_volume(&self) -> u64 {
        self.asks.iter().map(|level| level.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> OrderBookSnapshot {
        OrderBookSnapshot {
            symbol: "BTC/USD".to_string(),
            timestamp: 1_700_000_000_000_000,
            bids: vec![
                BookLevel {
                    price: 50_000,
                    quantity: 10,
                    order_count: 2,
                },
                BookLevel {
                    price: 49_900,
                    quantity: 4,
                    order_count: 1,
                },
            ],
            asks: vec![
                BookLevel {
                    price: 50_100,
                    quantity: 7,
                    order_count: 1,
                },
                BookLevel {
                    price: 50_200,
                    quantity: 3,
                    order_count: 3,
                },
            ],
        }
    }

    #[test]
    fn test_best_prices_come_from_front() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.best_bid(), Some((50_000, 10)));
        assert_eq!(snapshot.best_ask(), Some((50_100, 7)));
    }

    #[test]
    fn test_spread_and_mid_price() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.spread(), Some(100));
        assert_eq!(snapshot.mid_price(), Some(50_050.0));
    }

    #[test]
    fn test_volumes_sum_all_levels() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.total_bid_volume(), 14);
        assert_eq!(snapshot.total_ask_volume(), 10);
    }

    #[test]
    fn test_empty_sides_yield_none() {
        let snapshot = OrderBookSnapshot {
            symbol: "EMPTY".to_string(),
            timestamp: 0,
            bids: Vec::new(),
            asks: Vec::new(),
        };
        assert_eq!(snapshot.best_bid(), None);
        assert_eq!(snapshot.best_ask(), None);
        assert_eq!(snapshot.spread(), None);
        assert_eq!(snapshot.mid_price(), None);
        assert_eq!(snapshot.total_bid_volume(), 0);
    }
}
