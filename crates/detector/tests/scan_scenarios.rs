//! End-to-end scanner scenarios: producer thread, ring, engine cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dexarb_core::{
    EngineConfig, PriceUpdate, ScannerConfig, Venue, U256, PRICE_PRECISION, RING_CAPACITY,
};
use dexarb_detector::Engine;
use dexarb_runtime::SpscRing;

const E18: u64 = PRICE_PRECISION;

fn update(pool_hash: u64, venue: Venue, token0: u64, token1: u64, r0: u64, r1: u64) -> PriceUpdate {
    PriceUpdate {
        timestamp_ns: pool_hash * 1_000_000,
        pool_hash,
        chain_id: 1,
        venue_id: venue.id(),
        token0,
        token1,
        reserve0: r0,
        reserve1: r1,
        price: 0,
    }
}

#[test]
fn producer_to_opportunity_pipeline() {
    let (mut tx, rx) = SpscRing::with_capacity(RING_CAPACITY).unwrap();
    let mut engine = Engine::new(rx, ScannerConfig::default(), EngineConfig::default()).unwrap();

    let producer = std::thread::spawn(move || {
        // Two venues on the WETH/USDC pair, one dislocated, plus an
        // unrelated balanced pair.
        let updates = vec![
            update(0x01, Venue::UniswapV2, 1, 2, E18, 2 * E18),
            update(0x02, Venue::SushiSwap, 1, 2, E18, 2 * E18 + E18 / 10),
            update(0x03, Venue::UniswapV2, 3, 4, E18, E18),
            update(0x04, Venue::SushiSwap, 3, 4, E18, E18),
        ];
        for u in updates {
            let mut pending = u;
            loop {
                match tx.push(pending) {
                    Ok(()) => break,
                    Err(back) => pending = back,
                }
            }
        }
    });
    producer.join().unwrap();

    let opportunities = engine.run_cycle();
    assert_eq!(engine.scanner().pool_count(), 4);
    assert_eq!(opportunities.len(), 1);

    let opp = &opportunities[0];
    assert_eq!(opp.buy_venue_id, Venue::UniswapV2.id());
    assert_eq!(opp.sell_venue_id, Venue::SushiSwap.id());
    assert!(opp.spread_bps >= 450 && opp.spread_bps <= 510);
    assert!(!opp.estimated_profit.is_zero());
    assert!(opp.is_cross_venue());
}

#[test]
fn repeated_updates_converge_not_accumulate() {
    let (mut tx, rx) = SpscRing::with_capacity(1024).unwrap();
    let mut engine = Engine::new(rx, ScannerConfig::default(), EngineConfig::default()).unwrap();

    for round in 0..50u64 {
        tx.push(update(0x11, Venue::UniswapV2, 1, 2, E18, 2 * E18 + round))
            .unwrap();
        tx.push(update(0x22, Venue::SushiSwap, 1, 2, E18, 2 * E18 + E18 / 10))
            .unwrap();
    }
    engine.run_cycle();
    assert_eq!(engine.scanner().pool_count(), 2);

    let price = engine
        .scanner()
        .registry()
        .get_price(Venue::UniswapV2.id(), 0x11)
        .unwrap();
    // Latest update wins.
    assert_eq!(price.price, U256::from_u128(2 * E18 as u128 + 49));
}

#[test]
fn same_venue_dislocations_stay_invisible_by_default() {
    let (mut tx, rx) = SpscRing::with_capacity(64).unwrap();
    let mut engine = Engine::new(rx, ScannerConfig::default(), EngineConfig::default()).unwrap();

    tx.push(update(0x31, Venue::UniswapV2, 1, 2, E18, 2 * E18)).unwrap();
    tx.push(update(0x32, Venue::UniswapV2, 1, 2, E18, 3 * E18)).unwrap();
    assert!(engine.run_cycle().is_empty());

    let mut relaxed = ScannerConfig::default();
    relaxed.allow_same_venue = true;
    engine.scanner_mut().set_config(relaxed);
    assert!(!engine.run_cycle().is_empty());
}

#[test]
fn streaming_scan_survives_a_live_producer() {
    let (mut tx, rx) = SpscRing::with_capacity(4096).unwrap();
    let mut engine = Engine::new(rx, ScannerConfig::default(), EngineConfig::default()).unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&shutdown);
    let producer = std::thread::spawn(move || {
        let mut i = 0u64;
        while !flag.load(Ordering::Acquire) {
            let venue = if i % 2 == 0 {
                Venue::UniswapV2
            } else {
                Venue::SushiSwap
            };
            let dislocation = (i % 7) * E18 / 100;
            let _ = tx.push(update(0x40 + i % 8, venue, 1, 2, E18, 2 * E18 + dislocation));
            i += 1;
        }
    });

    for _ in 0..200 {
        engine.run_cycle();
        // Every streamed opportunity is fully admitted, even mid-churn.
        engine.scanner_mut().scan_streaming(|opp| {
            assert!(!opp.estimated_profit.is_zero());
            assert!(opp.spread_bps >= 10);
            assert!(opp.is_cross_venue());
        });
    }
    shutdown.store(true, Ordering::Release);
    producer.join().unwrap();

    // The scanner stays consistent under churn; opportunities may or may
    // not exist at any instant, but pools never leak.
    assert!(engine.scanner().pool_count() <= 8);
}
