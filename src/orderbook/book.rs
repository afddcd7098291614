//! Core OrderBook implementation for managing price levels and orders

use super::level::PriceLevel;
use super::order::{Order, Side};
use super::snapshot::{BookLevel, OrderBookSnapshot};
use super::trade::Trade;
use crate::utils::current_time_micros;
use crossbeam::atomic::AtomicCell;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Default number of trades retained per book for history queries.
pub const DEFAULT_TRADE_CAPACITY: usize = 1_000;

/// Mutable book state guarded by the book lock.
///
/// The orders map is the owning arena: it holds exactly the resting,
/// active orders. The side indices store order ids only and are always
/// consistent with the arena at lock release; an order reaching a
/// terminal state leaves both in the same critical section.
pub(super) struct BookState {
    pub(super) orders: HashMap<u64, Order>,
    /// Bid levels keyed by price; the best bid is the greatest key.
    pub(super) bids: BTreeMap<u128, PriceLevel>,
    /// Ask levels keyed by price; the best ask is the least key.
    pub(super) asks: BTreeMap<u128, PriceLevel>,
    /// Bounded trade history, newest at the back.
    pub(super) recent_trades: VecDeque<Trade>,
}

/// The OrderBook owns all resting orders for one symbol and executes
/// incoming orders against the opposite side with price-time priority.
///
/// All mutating operations (`process`, `cancel`) take the write lock;
/// market-data queries take the read lock and may run concurrently with
/// each other. The trade-id counter and last-trade price live outside the
/// lock as atomics.
pub struct OrderBook {
    symbol: String,
    pub(super) state: RwLock<BookState>,
    pub(super) next_trade_id: AtomicU64,
    pub(super) last_trade_price: AtomicCell<u128>,
    pub(super) has_traded: AtomicBool,
    pub(super) trade_capacity: usize,
}

impl OrderBook {
    /// Create a new order book for the given symbol.
    pub fn new(symbol: &str) -> Self {
        Self::with_trade_capacity(symbol, DEFAULT_TRADE_CAPACITY)
    }

    /// Create a new order book retaining up to `trade_capacity` recent
    /// trades for [`Self::recent_trades`] queries.
    pub fn with_trade_capacity(symbol: &str, trade_capacity: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            state: RwLock::new(BookState {
                orders: HashMap::new(),
                bids: BTreeMap::new(),
                asks: BTreeMap::new(),
                recent_trades: VecDeque::with_capacity(trade_capacity.min(64)),
            }),
            next_trade_id: AtomicU64::new(1),
            last_trade_price: AtomicCell::new(0),
            has_traded: AtomicBool::new(false),
            trade_capacity,
        }
    }

    /// The symbol this book trades.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Cancel a resting order.
    ///
    /// Returns `true` only when the order is currently live (`New` or
    /// `PartiallyFilled`); the order is removed from its price level and
    /// the arena immediately. Unknown ids and orders that already reached
    /// a terminal state report `false` with no state change.
    pub fn cancel(&self, order_id: u64) -> bool {
        let mut state = self.state.write();

        let Some(mut order) = state.orders.remove(&order_id) else {
            trace!(
                "Order book {}: cancel {} ignored, not resting",
                self.symbol, order_id
            );
            return false;
        };

        let remaining = order.remaining_quantity();
        let (price, side) = (order.price, order.side);
        let levels = match side {
            Side::Buy => &mut state.bids,
            Side::Sell => &mut state.asks,
        };

        let level = levels
            .get_mut(&price)
            .expect("resting order has no price level");
        let removed = level.remove(order_id, remaining);
        debug_assert!(removed, "resting order missing from its level queue");
        if level.is_empty() {
            levels.remove(&price);
        }

        order.cancel();
        trace!("Order book {}: cancelled {}", self.symbol, order);
        true
    }

    /// Get the best bid price, if any.
    pub fn best_bid(&self) -> Option<u128> {
        self.state.read().bids.keys().next_back().copied()
    }

    /// Get the best ask price, if any.
    pub fn best_ask(&self) -> Option<u128> {
        self.state.read().asks.keys().next().copied()
    }

    /// Get the spread (best ask - best bid). `None` unless both sides are
    /// populated.
    pub fn spread(&self) -> Option<u128> {
        let state = self.state.read();
        let bid = state.bids.keys().next_back()?;
        let ask = state.asks.keys().next()?;
        Some(ask.saturating_sub(*bid))
    }

    /// Get the mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<f64> {
        let state = self.state.read();
        let bid = state.bids.keys().next_back()?;
        let ask = state.asks.keys().next()?;
        Some((*bid as f64 + *ask as f64) / 2.0)
    }

    /// Get the last trade price, if any trade has occurred.
    pub fn last_trade_price(&self) -> Option<u128> {
        if self.has_traded.load(Ordering::Relaxed) {
            Some(self.last_trade_price.load())
        } else {
            None
        }
    }

    /// Up to `max_levels` bid levels, best (highest price) first.
    pub fn bid_levels(&self, max_levels: usize) -> Vec<BookLevel> {
        let state = self.state.read();
        Self::aggregate_levels(state.bids.iter().rev(), max_levels)
    }

    /// Up to `max_levels` ask levels, best (lowest price) first.
    pub fn ask_levels(&self, max_levels: usize) -> Vec<BookLevel> {
        let state = self.state.read();
        Self::aggregate_levels(state.asks.iter(), max_levels)
    }

    fn aggregate_levels<'a>(
        levels: impl Iterator<Item = (&'a u128, &'a PriceLevel)>,
        max_levels: usize,
    ) -> Vec<BookLevel> {
        levels
            .take(max_levels)
            .map(|(price, level)| BookLevel {
                price: *price,
                quantity: level.total_quantity(),
                order_count: level.order_count() as u32,
            })
            .collect()
    }

    /// Total remaining quantity across all bid levels.
    pub fn bid_volume(&self) -> u64 {
        self.state
            .read()
            .bids
            .values()
            .map(PriceLevel::total_quantity)
            .sum()
    }

    /// Total remaining quantity across all ask levels.
    pub fn ask_volume(&self) -> u64 {
        self.state
            .read()
            .asks
            .values()
            .map(PriceLevel::total_quantity)
            .sum()
    }

    /// A copy of a resting order, if it is live in this book.
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.state.read().orders.get(&order_id).cloned()
    }

    /// Copies of all resting orders, ordered by arrival (order id).
    pub fn open_orders(&self) -> Vec<Order> {
        let state = self.state.read();
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by_key(|order| order.order_id);
        orders
    }

    /// Number of resting orders.
    pub fn order_count(&self) -> usize {
        self.state.read().orders.len()
    }

    /// The last `count` trades emitted by this book, oldest first.
    ///
    /// History is bounded by the capacity given at construction; trades
    /// older than that are gone.
    pub fn recent_trades(&self, count: usize) -> Vec<Trade> {
        let state = self.state.read();
        let len = state.recent_trades.len();
        state
            .recent_trades
            .iter()
            .skip(len.saturating_sub(count))
            .cloned()
            .collect()
    }

    /// A detached market-data snapshot with up to `depth` levels per side.
    pub fn snapshot(&self, depth: usize) -> OrderBookSnapshot {
        let state = self.state.read();
        OrderBookSnapshot {
            symbol: self.symbol.clone(),
            timestamp: current_time_micros(),
            bids: Self::aggregate_levels(state.bids.iter().rev(), depth),
            asks: Self::aggregate_levels(state.asks.iter(), depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::order::OrderStatus;

    fn resting(book: &OrderBook, id: u64, side: Side, price: u128, quantity: u64) {
        let order = Order::new(id, 100 + id, book.symbol(), side, price, quantity);
        let report = book.process(order);
        assert!(report.trades.is_empty(), "order {id} unexpectedly crossed");
    }

    #[test]
    fn test_empty_book_queries() {
        let book = OrderBook::new("BTC/USD");
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.spread(), None);
        assert_eq!(book.mid_price(), None);
        assert_eq!(book.last_trade_price(), None);
        assert_eq!(book.bid_volume(), 0);
        assert_eq!(book.ask_volume(), 0);
        assert_eq!(book.order_count(), 0);
        assert!(book.open_orders().is_empty());
    }

    #[test]
    fn test_best_prices_and_spread() {
        let book = OrderBook::new("BTC/USD");
        resting(&book, 1, Side::Buy, 50_000, 10);
        resting(&book, 2, Side::Sell, 50_100, 5);

        assert_eq!(book.best_bid(), Some(50_000));
        assert_eq!(book.best_ask(), Some(50_100));
        assert_eq!(book.spread(), Some(100));
        assert_eq!(book.mid_price(), Some(50_050.0));
    }

    #[test]
    fn test_cancel_removes_order_eagerly() {
        let book = OrderBook::new("BTC/USD");
        resting(&book, 1, Side::Buy, 50_000, 10);

        assert!(book.cancel(1));
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.order(1), None);
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.bid_volume(), 0);

        // Second cancel finds nothing.
        assert!(!book.cancel(1));
    }

    #[test]
    fn test_cancel_unknown_order() {
        let book = OrderBook::new("BTC/USD");
        assert!(!book.cancel(999));
    }

    #[test]
    fn test_cancel_keeps_other_orders_at_level() {
        let book = OrderBook::new("BTC/USD");
        resting(&book, 1, Side::Buy, 50_000, 10);
        resting(&book, 2, Side::Buy, 50_000, 7);

        assert!(book.cancel(1));
        assert_eq!(book.best_bid(), Some(50_000));
        assert_eq!(book.bid_volume(), 7);
        let levels = book.bid_levels(1);
        assert_eq!(levels[0].order_count, 1);
    }

    #[test]
    fn test_level_aggregation_orders_best_first() {
        let book = OrderBook::new("BTC/USD");
        resting(&book, 1, Side::Buy, 50_000, 10);
        resting(&book, 2, Side::Buy, 49_900, 4);
        resting(&book, 3, Side::Buy, 50_000, 6);
        resting(&book, 4, Side::Sell, 50_100, 3);
        resting(&book, 5, Side::Sell, 50_200, 8);

        let bids = book.bid_levels(10);
        assert_eq!(bids.len(), 2);
        assert_eq!(
            bids[0],
            BookLevel {
                price: 50_000,
                quantity: 16,
                order_count: 2
            }
        );
        assert_eq!(
            bids[1],
            BookLevel {
                price: 49_900,
                quantity: 4,
                order_count: 1
            }
        );

        let asks = book.ask_levels(10);
        assert_eq!(asks[0].price, 50_100);
        assert_eq!(asks[1].price, 50_200);
    }

    #[test]
    fn test_level_query_respects_max_levels() {
        let book = OrderBook::new("BTC/USD");
        resting(&book, 1, Side::Buy, 50_000, 1);
        resting(&book, 2, Side::Buy, 49_900, 1);
        resting(&book, 3, Side::Buy, 49_800, 1);

        assert_eq!(book.bid_levels(2).len(), 2);
        assert!(book.bid_levels(0).is_empty());
    }

    #[test]
    fn test_open_orders_sorted_by_id() {
        let book = OrderBook::new("BTC/USD");
        resting(&book, 3, Side::Buy, 49_800, 1);
        resting(&book, 1, Side::Buy, 50_000, 1);
        resting(&book, 2, Side::Sell, 50_100, 1);

        let ids: Vec<u64> = book.open_orders().iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(book
            .open_orders()
            .iter()
            .all(|o| o.status == OrderStatus::New));
    }

    #[test]
    fn test_snapshot_reflects_book() {
        let book = OrderBook::new("BTC/USD");
        resting(&book, 1, Side::Buy, 50_000, 10);
        resting(&book, 2, Side::Sell, 50_100, 5);

        let snapshot = book.snapshot(10);
        assert_eq!(snapshot.symbol, "BTC/USD");
        assert_eq!(snapshot.best_bid(), Some((50_000, 10)));
        assert_eq!(snapshot.best_ask(), Some((50_100, 5)));
        assert_eq!(snapshot.spread(), Some(100));
        assert!(snapshot.timestamp > 0);
    }
}
