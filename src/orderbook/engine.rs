//! Multi-symbol matching engine: id issuance, symbol routing, statistics
//! and trade fan-out.

use super::book::OrderBook;
use super::error::EngineError;
use super::order::{Order, Side};
use super::snapshot::{BookLevel, OrderBookSnapshot};
use super::stats::{EngineStats, StatsSnapshot};
use super::trade::{Trade, TradeObserver};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// The engine hosts one [`OrderBook`] per symbol, assigns globally unique
/// order ids, routes submissions and cancellations, aggregates statistics
/// and fans emitted trades out to an optional observer.
///
/// All operations are safe to call from any thread. Engine-level maps are
/// concurrent and released before any book lock is taken; at most one
/// book lock is held at a time, and the observer always runs with no lock
/// held.
pub struct MatchingEngine {
    /// Order books by symbol.
    books: DashMap<String, Arc<OrderBook>>,
    /// Order id to symbol mapping for cancellation routing. Tracks live
    /// orders only; entries leave when their order reaches a terminal
    /// state.
    order_to_symbol: DashMap<u64, String>,
    /// Global order id allocator; assignment order is the engine-wide
    /// arrival order.
    next_order_id: AtomicU64,
    stats: EngineStats,
    observer: RwLock<Option<TradeObserver>>,
    /// Trade history capacity handed to newly created books.
    trade_capacity: usize,
}

impl MatchingEngine {
    /// Create an engine with the default per-book trade history capacity.
    pub fn new() -> Self {
        Self::with_trade_capacity(super::book::DEFAULT_TRADE_CAPACITY)
    }

    /// Create an engine whose books retain up to `trade_capacity` recent
    /// trades each.
    pub fn with_trade_capacity(trade_capacity: usize) -> Self {
        Self {
            books: DashMap::new(),
            order_to_symbol: DashMap::new(),
            next_order_id: AtomicU64::new(1),
            stats: EngineStats::default(),
            observer: RwLock::new(None),
            trade_capacity,
        }
    }

    /// Submit a limit order.
    ///
    /// Validates the submission, assigns the next order id, routes the
    /// order to its symbol's book (creating the book on first use),
    /// matches it, settles statistics and notifies the observer once per
    /// emitted trade, in trade-id order.
    ///
    /// Returns the assigned order id; ids are unique and strictly
    /// increasing in assignment order across all threads and symbols.
    ///
    /// # Errors
    /// Returns [`EngineError`] when the symbol is empty or the price or
    /// quantity is zero. Rejected submissions consume no order id, create
    /// no book and only increment `rejected_orders`.
    pub fn submit(
        &self,
        client_id: u64,
        symbol: &str,
        side: Side,
        price: u128,
        quantity: u64,
    ) -> Result<u64, EngineError> {
        if let Err(err) = validate(symbol, price, quantity) {
            self.stats.record_reject();
            trace!("Rejected order from client {client_id}: {err}");
            return Err(err);
        }

        let order_id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        let order = Order::new(order_id, client_id, symbol, side, price, quantity);

        self.stats.record_submit();
        self.order_to_symbol.insert(order_id, symbol.to_string());

        let book = self.book_for(symbol);
        let report = book.process(order);

        if report.is_complete {
            self.stats.record_terminal();
            self.order_to_symbol.remove(&order_id);
        }
        for maker_id in &report.filled_maker_ids {
            self.stats.record_terminal();
            self.order_to_symbol.remove(maker_id);
        }

        // Fan trades out after every lock is released. The observer slot
        // read is dropped before the first invocation.
        let observer = self.observer.read().clone();
        for trade in &report.trades {
            self.stats.record_trade();
            if let Some(ref observer) = observer {
                observer(trade);
            }
        }

        Ok(order_id)
    }

    /// Cancel an order by id.
    ///
    /// Returns `true` when a live order was found and cancelled;
    /// unknown ids and orders already filled or cancelled return `false`
    /// with no state change.
    pub fn cancel(&self, order_id: u64) -> bool {
        let Some(symbol) = self
            .order_to_symbol
            .get(&order_id)
            .map(|entry| entry.value().clone())
        else {
            return false;
        };

        let Some(book) = self.books.get(&symbol).map(|entry| entry.value().clone()) else {
            return false;
        };

        let cancelled = book.cancel(order_id);
        if cancelled {
            self.stats.record_cancel();
            self.stats.record_terminal();
            self.order_to_symbol.remove(&order_id);
        }
        cancelled
    }

    /// Install the trade observer, replacing any previous one.
    ///
    /// The observer is invoked synchronously on the submitting thread,
    /// once per emitted trade in trade-id order, after the book lock has
    /// been released. It must be non-blocking and infallible, and must
    /// not call back into this engine (`submit`/`cancel`) from within the
    /// callback.
    pub fn set_trade_observer(&self, observer: TradeObserver) {
        *self.observer.write() = Some(observer);
    }

    /// Remove the trade observer, if any.
    pub fn clear_trade_observer(&self) {
        *self.observer.write() = None;
    }

    /// Best bid for a symbol, if the book exists and has bids.
    pub fn best_bid(&self, symbol: &str) -> Option<u128> {
        self.with_book(symbol, |book| book.best_bid()).flatten()
    }

    /// Best ask for a symbol, if the book exists and has asks.
    pub fn best_ask(&self, symbol: &str) -> Option<u128> {
        self.with_book(symbol, |book| book.best_ask()).flatten()
    }

    /// Spread for a symbol; `None` unless both sides are populated.
    pub fn spread(&self, symbol: &str) -> Option<u128> {
        self.with_book(symbol, |book| book.spread()).flatten()
    }

    /// Mid price for a symbol; `None` unless both sides are populated.
    pub fn mid_price(&self, symbol: &str) -> Option<f64> {
        self.with_book(symbol, |book| book.mid_price()).flatten()
    }

    /// Up to `max_levels` aggregated bid levels, best first.
    pub fn bid_levels(&self, symbol: &str, max_levels: usize) -> Vec<BookLevel> {
        self.with_book(symbol, |book| book.bid_levels(max_levels))
            .unwrap_or_default()
    }

    /// Up to `max_levels` aggregated ask levels, best first.
    pub fn ask_levels(&self, symbol: &str, max_levels: usize) -> Vec<BookLevel> {
        self.with_book(symbol, |book| book.ask_levels(max_levels))
            .unwrap_or_default()
    }

    /// Total resting bid quantity for a symbol.
    pub fn bid_volume(&self, symbol: &str) -> u64 {
        self.with_book(symbol, |book| book.bid_volume())
            .unwrap_or(0)
    }

    /// Total resting ask quantity for a symbol.
    pub fn ask_volume(&self, symbol: &str) -> u64 {
        self.with_book(symbol, |book| book.ask_volume())
            .unwrap_or(0)
    }

    /// The last `count` trades for a symbol, oldest first.
    pub fn trades(&self, symbol: &str, count: usize) -> Vec<Trade> {
        self.with_book(symbol, |book| book.recent_trades(count))
            .unwrap_or_default()
    }

    /// Copies of all resting orders for a symbol, ordered by arrival.
    pub fn open_orders(&self, symbol: &str) -> Vec<Order> {
        self.with_book(symbol, |book| book.open_orders())
            .unwrap_or_default()
    }

    /// A market-data snapshot for a symbol with up to `depth` levels per
    /// side.
    pub fn snapshot(&self, symbol: &str, depth: usize) -> Option<OrderBookSnapshot> {
        self.with_book(symbol, |book| book.snapshot(depth))
    }

    /// All symbols with a book, in no particular order.
    pub fn all_symbols(&self) -> Vec<String> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Lookup-or-create the book for a symbol. The map entry guard is
    /// dropped before the returned book is used.
    fn book_for(&self, symbol: &str) -> Arc<OrderBook> {
        if let Some(book) = self.books.get(symbol) {
            return book.value().clone();
        }
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| {
                trace!("Creating order book for symbol {symbol}");
                Arc::new(OrderBook::with_trade_capacity(symbol, self.trade_capacity))
            })
            .value()
            .clone()
    }

    fn with_book<R>(&self, symbol: &str, f: impl FnOnce(&OrderBook) -> R) -> Option<R> {
        let book = self.books.get(symbol).map(|entry| entry.value().clone())?;
        Some(f(&book))
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(symbol: &str, price: u128, quantity: u64) -> Result<(), EngineError> {
    if symbol.is_empty() {
        return Err(EngineError::EmptySymbol);
    }
    if price == 0 {
        return Err(EngineError::InvalidPrice { price });
    }
    if quantity == 0 {
        return Err(EngineError::InvalidQuantity { quantity });
    }
    Ok(())
}
