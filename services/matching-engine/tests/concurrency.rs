//! Concurrent access to the exchange
//!
//! Writers on different pairs run in parallel; readers racing a writer on
//! the same pair only ever see a complete, uncrossed book.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use claims_matching_engine::{EngineConfig, Exchange, RecordingSettlement};
use types::ids::{AccountId, TradingPair};
use types::numeric::{Amount, Price};
use types::order::Side;

fn exchange() -> Arc<Exchange<RecordingSettlement>> {
    Arc::new(Exchange::new(EngineConfig::default(), RecordingSettlement::default()).unwrap())
}

#[test]
fn writers_on_separate_pairs() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let ex = exchange();
    let pairs: Vec<_> = ["FLOOD-2025", "QUAKE-2026", "STORM-2027", "FIRE-2028"]
        .into_iter()
        .map(|base| TradingPair::new(base, "USDC").unwrap())
        .collect();

    let handles: Vec<_> = pairs
        .iter()
        .cloned()
        .map(|pair| {
            let ex = Arc::clone(&ex);
            thread::spawn(move || {
                let maker = AccountId::new();
                let taker = AccountId::new();
                for i in 0..200u64 {
                    ex.place_limit(maker, Side::Sell, &pair, Amount::new(2), Price::from_units(100 + i % 5))
                        .unwrap();
                    ex.place_limit(taker, Side::Buy, &pair, Amount::new(1), Price::from_units(104))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for pair in &pairs {
        let list = ex.get_list(pair);
        // 400 base sold into 200 buys of 1 each
        assert!(list.bids.is_empty());
        let resting: u128 = ex
            .depth(pair, usize::MAX)
            .asks
            .iter()
            .map(|level| level.quantity.raw())
            .sum();
        assert_eq!(resting, 200);
        ex.read_book(pair, |book| book.check_invariants()).unwrap().unwrap();
    }

    let total: usize = pairs
        .iter()
        .filter_map(|pair| ex.read_book(pair, |book| book.total_orders()))
        .sum();
    assert_eq!(total, 4 * 400);
    assert_eq!(ex.pairs().len(), 4);
}

#[test]
fn readers_never_observe_crossed_book() {
    let ex = exchange();
    let pair = TradingPair::new("FLOOD-2025", "USDC").unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let ex = Arc::clone(&ex);
        let pair = pair.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let a = AccountId::new();
            let b = AccountId::new();
            for i in 0..500u64 {
                let price = Price::from_units(90 + i % 20);
                ex.place_limit(a, Side::Buy, &pair, Amount::new(3), price).unwrap();
                ex.place_limit(b, Side::Sell, &pair, Amount::new(2), price).unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let ex = Arc::clone(&ex);
            let pair = pair.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0u64;
                while !done.load(Ordering::Acquire) || reads == 0 {
                    if let Some(result) = ex.read_book(&pair, |book| book.check_invariants()) {
                        assert_eq!(result, Ok(()));
                    }
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
}

#[test]
fn held_settlement_does_not_block_other_pairs() {
    let ex = exchange();
    let flood = TradingPair::new("FLOOD-2025", "USDC").unwrap();
    let quake = TradingPair::new("QUAKE-2026", "USDC").unwrap();
    let maker = AccountId::new();
    let taker = AccountId::new();
    ex.place_limit(maker, Side::Sell, &flood, Amount::new(5), Price::from_units(100))
        .unwrap();

    // Settlement busy, as if a FLOOD batch were in flight
    let guard = ex.settlement();

    let (tx, rx) = mpsc::channel();
    let worker = {
        let ex = Arc::clone(&ex);
        thread::spawn(move || {
            let resting = ex
                .place_limit(taker, Side::Buy, &quake, Amount::new(3), Price::from_units(90))
                .map(|placed| placed.is_resting());
            let cancelled = ex.cancel(maker, ex.get_list(&flood).asks[0]).is_ok();
            tx.send((resting, cancelled)).unwrap();
        })
    };

    let outcome = rx.recv_timeout(Duration::from_secs(5));
    drop(guard);
    worker.join().unwrap();

    assert_eq!(outcome, Ok((Ok(true), true)));
    assert!(ex.settlement().journal.is_empty());
}
