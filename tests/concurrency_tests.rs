//! Concurrency: the engine under parallel submissions, cancellations and
//! queries, with invariants checked after quiescing.

use matchbook_rs::{MatchingEngine, Side, Trade};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

const SYMBOLS: [&str; 3] = ["BTC/USD", "ETH/USD", "SOL/USD"];

#[test]
fn test_parallel_submissions_assign_unique_ids() {
    let engine = Arc::new(MatchingEngine::new());
    let mut handles = Vec::new();

    for worker in 0..8u64 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            let mut ids = Vec::with_capacity(250);
            for i in 0..250u64 {
                let symbol = SYMBOLS[(worker + i) as usize % SYMBOLS.len()];
                let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                // Wide, non-crossing price bands per side keep this test
                // focused on id issuance rather than matching.
                let price = if side == Side::Buy { 1_000 + i as u128 } else { 10_000 + i as u128 };
                ids.push(engine.submit(worker, symbol, side, price, 1).unwrap());
            }
            ids
        }));
    }

    let mut all_ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all_ids.sort_unstable();
    let len = all_ids.len();
    all_ids.dedup();
    assert_eq!(all_ids.len(), len);
    assert_eq!(len, 2_000);
    assert_eq!(engine.stats().total_orders, 2_000);
}

#[test]
fn test_observer_count_matches_trades_under_contention() {
    let engine = Arc::new(MatchingEngine::new());
    let invocations = Arc::new(AtomicU64::new(0));
    let counter = invocations.clone();
    engine.set_trade_observer(Arc::new(move |_trade: &Trade| {
        counter.fetch_add(1, Ordering::Relaxed);
    }));

    let mut handles = Vec::new();
    for worker in 0..6u64 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..200u64 {
                let symbol = SYMBOLS[worker as usize % SYMBOLS.len()];
                // Alternate crossing buys and sells at one price so the
                // books trade heavily.
                let side = if (worker + i) % 2 == 0 { Side::Buy } else { Side::Sell };
                engine.submit(worker, symbol, side, 5_000, 2).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        invocations.load(Ordering::Relaxed),
        engine.stats().total_trades
    );
}

#[test]
fn test_active_orders_consistent_after_quiesce() {
    let engine = Arc::new(MatchingEngine::new());
    let mut handles = Vec::new();

    for worker in 0..6u64 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..300u64 {
                let symbol = SYMBOLS[i as usize % SYMBOLS.len()];
                let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                let price = 4_000 + ((worker * 7 + i) % 40) as u128;
                let id = engine.submit(worker, symbol, side, price, 3).unwrap();
                // Cancel a third of the orders right away; some will have
                // already matched, which must report false harmlessly.
                if i % 3 == 0 {
                    engine.cancel(id);
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Invariant: the counter equals the actual number of resting active
    // orders across all books.
    let open_total: u64 = SYMBOLS
        .iter()
        .map(|s| engine.open_orders(s).len() as u64)
        .sum();
    assert_eq!(engine.stats().active_orders, open_total);

    // Invariant: no crossed book at quiescence.
    for symbol in SYMBOLS {
        if let (Some(bid), Some(ask)) = (engine.best_bid(symbol), engine.best_ask(symbol)) {
            assert!(bid < ask, "{symbol} crossed: bid {bid} >= ask {ask}");
        }
    }
}

#[test]
fn test_queries_run_concurrently_with_matching() {
    let engine = Arc::new(MatchingEngine::new());
    let mut handles = Vec::new();

    for worker in 0..3u64 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..400u64 {
                let side = if (worker + i) % 2 == 0 { Side::Buy } else { Side::Sell };
                engine
                    .submit(worker, "BTC/USD", side, 5_000 + (i % 10) as u128, 1)
                    .unwrap();
            }
        }));
    }

    // Reader thread hammers market-data queries while writers run.
    let reader = {
        let engine = engine.clone();
        thread::spawn(move || {
            for _ in 0..2_000 {
                let _ = engine.best_bid("BTC/USD");
                let _ = engine.bid_levels("BTC/USD", 5);
                let _ = engine.snapshot("BTC/USD", 5);
                let _ = engine.stats();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    reader.join().unwrap();

    // Totals still line up once writers are done.
    assert_eq!(engine.stats().total_orders, 1_200);
}
