//! # Multi-Symbol Limit-Order Matching Engine
//!
//! A price-time priority matching core for an electronic trading venue,
//! written for correctness under concurrency and predictable latency. The
//! crate exposes a purely programmatic API: a [`MatchingEngine`] that
//! accepts limit orders and cancellations from any thread, matches them
//! against per-symbol [`OrderBook`]s, and streams resulting [`Trade`]s to
//! an installed observer.
//!
//! ## Key Properties
//!
//! - **Price-time priority**: the best price executes first; among equal
//!   prices, strict FIFO by arrival. Executions always happen at the
//!   maker's resting price.
//! - **Exact arithmetic**: prices are integers in minor currency units
//!   (`u128`) and quantities are `u64`. No floating point participates in
//!   matching, priority or aggregation.
//! - **Arena-owned books**: each book owns its orders in a map keyed by
//!   order id; side indices hold ids only, never references, so the
//!   book's invariants stay mechanically checkable.
//! - **Eager cancellation**: a cancelled order leaves its price level and
//!   the book immediately; no tombstones linger in the indices.
//! - **One lock per book**: submissions and cancellations for a symbol
//!   serialize on that book's lock; market-data queries share a read
//!   lock. Engine-level maps are concurrent and never held across a book
//!   operation, and the trade observer runs with no lock held.
//!
//! ## Example
//!
//! ```
//! use matchbook_rs::{MatchingEngine, Side};
//! use std::sync::Arc;
//!
//! let engine = MatchingEngine::new();
//! engine.set_trade_observer(Arc::new(|trade| {
//!     println!("trade {} @ {}", trade.quantity, trade.price);
//! }));
//!
//! let maker = engine.submit(100, "BTC/USD", Side::Buy, 50_000, 10).unwrap();
//! engine.submit(101, "BTC/USD", Side::Sell, 50_000, 4).unwrap();
//!
//! assert_eq!(engine.best_bid("BTC/USD"), Some(50_000));
//! assert_eq!(engine.stats().total_trades, 1);
//! assert!(engine.cancel(maker));
//! ```
//!
//! ## Scope
//!
//! Only resting limit orders are supported: no market or stop orders, no
//! iceberg, no self-trade prevention, no fees, no cancel/replace, and no
//! persistence of the book across restarts. Ingress decoding and durable
//! egress are the caller's concern; the [`orderbook::events`] adapters
//! provide the observer-to-channel plumbing an egress publisher needs.

pub mod orderbook;

pub mod prelude;
mod utils;

pub use orderbook::{
    BookLevel, EngineError, EngineStats, ExecutionReport, MatchingEngine, Order, OrderBook,
    OrderBookSnapshot, OrderStatus, Side, StatsSnapshot, Trade, TradeObserver,
};
pub use utils::{current_time_micros, current_time_millis};
