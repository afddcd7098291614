//! Contains the core matching logic for the order book.
//!
//! An incoming order is executed against the opposite side with strict
//! price-time priority: the best price first, and among equal prices the
//! earliest arrival (lowest order id, since ids are engine-monotonic).
//! Every execution happens at the maker's resting price.

use super::book::OrderBook;
use super::order::{Order, Side};
use super::trade::Trade;
use crate::utils::current_time_micros;
use std::sync::atomic::Ordering;
use tracing::trace;

/// Outcome of processing one incoming order.
///
/// Trades appear in emission order (strictly increasing trade ids).
/// `filled_maker_ids` lists every resting order this execution completed,
/// so the caller can settle active-order accounting without re-querying
/// the book.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// The incoming (taker) order id.
    pub order_id: u64,
    /// Trades generated by this execution, in emission order.
    pub trades: Vec<Trade>,
    /// Taker quantity left open after matching.
    pub remaining_quantity: u64,
    /// Whether the taker was fully executed.
    pub is_complete: bool,
    /// Resting orders fully executed by this submission.
    pub filled_maker_ids: Vec<u64>,
}

impl ExecutionReport {
    /// Total quantity executed for the taker.
    pub fn executed_quantity(&self) -> u64 {
        self.trades.iter().map(|t| t.quantity).sum()
    }
}

impl OrderBook {
    /// Process an incoming order: match it against the opposite side,
    /// then rest any remainder on its own side.
    ///
    /// The whole operation runs under the book's write lock; concurrent
    /// submissions and cancellations against the same book serialize
    /// here. Callers must have validated the order (positive price and
    /// quantity) already; the book never rejects.
    pub fn process(&self, mut order: Order) -> ExecutionReport {
        debug_assert_eq!(order.symbol, self.symbol(), "order routed to wrong book");

        let mut guard = self.state.write();
        let mut trades: Vec<Trade> = Vec::new();
        let mut filled_maker_ids: Vec<u64> = Vec::new();

        while order.remaining_quantity() > 0 {
            let state = &mut *guard;
            let opposite = match order.side {
                Side::Buy => &mut state.asks,
                Side::Sell => &mut state.bids,
            };

            // Best opposite price: lowest ask for a buy, highest bid for
            // a sell.
            let best = match order.side {
                Side::Buy => opposite.keys().next().copied(),
                Side::Sell => opposite.keys().next_back().copied(),
            };
            let Some(level_price) = best else {
                break;
            };
            if !crosses(order.side, order.price, level_price) {
                break;
            }

            let level = opposite
                .get_mut(&level_price)
                .expect("best price vanished under the book lock");
            let maker_id = level
                .front()
                .expect("empty price level left in side index");
            let maker = state
                .orders
                .get_mut(&maker_id)
                .expect("side index references unknown order");

            let quantity = order.remaining_quantity().min(maker.remaining_quantity());
            let trade_id = self.next_trade_id.fetch_add(1, Ordering::Relaxed);
            let trade = Trade {
                trade_id,
                taker_order_id: order.order_id,
                maker_order_id: maker.order_id,
                taker_client_id: order.client_id,
                maker_client_id: maker.client_id,
                symbol: self.symbol().to_string(),
                price: maker.price,
                quantity,
                timestamp: current_time_micros(),
            };

            maker.fill(quantity);
            order.fill(quantity);
            level.reduce(quantity);

            if maker.is_filled() {
                level.pop_front();
                state.orders.remove(&maker_id);
                filled_maker_ids.push(maker_id);
            }
            if level.is_empty() {
                opposite.remove(&level_price);
            }

            trace!(
                "Order book {}: matched {} @ {} (taker {}, maker {})",
                self.symbol(),
                quantity,
                trade.price,
                trade.taker_order_id,
                trade.maker_order_id
            );
            trades.push(trade);
        }

        if let Some(last) = trades.last() {
            self.last_trade_price.store(last.price);
            self.has_traded.store(true, Ordering::Relaxed);
        }

        let state = &mut *guard;
        if self.trade_capacity > 0 {
            for trade in &trades {
                if state.recent_trades.len() == self.trade_capacity {
                    state.recent_trades.pop_front();
                }
                state.recent_trades.push_back(trade.clone());
            }
        }

        let order_id = order.order_id;
        let remaining_quantity = order.remaining_quantity();
        let is_complete = order.is_filled();

        if remaining_quantity > 0 && order.is_active() {
            let own_side = match order.side {
                Side::Buy => &mut state.bids,
                Side::Sell => &mut state.asks,
            };
            own_side
                .entry(order.price)
                .or_default()
                .push(order_id, remaining_quantity);
            trace!("Order book {}: resting {}", self.symbol(), order);
            state.orders.insert(order_id, order);
        }

        ExecutionReport {
            order_id,
            trades,
            remaining_quantity,
            is_complete,
            filled_maker_ids,
        }
    }
}

/// Whether an incoming price at `side` crosses a resting price on the
/// opposite side.
#[inline]
fn crosses(side: Side, incoming: u128, resting: u128) -> bool {
    match side {
        Side::Buy => incoming >= resting,
        Side::Sell => incoming <= resting,
    }
}
