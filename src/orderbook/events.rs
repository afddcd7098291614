//! Trade event plumbing: adapters that turn channel senders into trade
//! observers, plus a logging consumer.
//!
//! This is the seam an egress publisher attaches to. The observer runs on
//! the submitting thread and must return promptly, so the adapters only
//! clone the trade and hand it to a channel; the slow side of the pipe
//! drains on its own thread or task.

use super::trade::{Trade, TradeObserver};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

/// Wrap a standard library channel sender as a trade observer.
///
/// Each emitted trade is cloned into the channel. A send failure (the
/// receiver hung up) is logged and otherwise ignored; the matching core
/// never blocks on egress.
pub fn channel_observer(sender: mpsc::Sender<Trade>) -> TradeObserver {
    Arc::new(move |trade: &Trade| {
        if let Err(e) = sender.send(trade.clone()) {
            error!("Failed to forward trade {}: {}", trade.trade_id, e);
        }
    })
}

/// Wrap a Tokio unbounded sender as a trade observer.
///
/// The unbounded channel keeps the observer non-blocking even when the
/// async consumer falls behind.
pub fn tokio_channel_observer(sender: tokio::sync::mpsc::UnboundedSender<Trade>) -> TradeObserver {
    Arc::new(move |trade: &Trade| {
        if let Err(e) = sender.send(trade.clone()) {
            error!("Failed to forward trade {}: {}", trade.trade_id, e);
        }
    })
}

/// Spawn a thread that drains a trade channel and logs each trade.
///
/// Returns the join handle; the thread exits when every sender is
/// dropped. Useful as a default egress during development and in
/// integration tests.
pub fn spawn_trade_logger(receiver: mpsc::Receiver<Trade>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        info!("Trade logger started");
        while let Ok(trade) = receiver.recv() {
            info!(
                "Trade {} on {}: {} @ {} (taker {}, maker {})",
                trade.trade_id,
                trade.symbol,
                trade.quantity,
                trade.price,
                trade.taker_order_id,
                trade.maker_order_id
            );
        }
        info!("Trade logger stopped");
    })
}
