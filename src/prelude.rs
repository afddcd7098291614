//! Prelude module that re-exports commonly used types and traits.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use matchbook_rs::prelude::*;
//! ```

// Core engine and book types
pub use crate::orderbook::{ExecutionReport, MatchingEngine, OrderBook};

// Order and trade types
pub use crate::orderbook::order::{Order, OrderStatus, Side};
pub use crate::orderbook::trade::{Trade, TradeObserver};

// Market data types
pub use crate::orderbook::snapshot::{BookLevel, OrderBookSnapshot};

// Statistics
pub use crate::orderbook::stats::{EngineStats, StatsSnapshot};

// Errors
pub use crate::orderbook::error::EngineError;

// Observer plumbing
pub use crate::orderbook::events::{channel_observer, spawn_trade_logger, tokio_channel_observer};

// Utility functions
pub use crate::utils::{current_time_micros, current_time_millis};
