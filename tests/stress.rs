//! Stress tests for PQMS
//!
//! Run with: cargo test --release stress -- --ignored

use pqms::*;
use std::time::Instant;

const T0: u64 = 1_706_745_600_000;

#[test]
#[ignore] // Run manually with --ignored
fn stress_test_long_run() {
    let mut engine = TransmissionEngine::new(SimulationConfig::default().with_seed(1)).unwrap();

    let cycles = 100_000u64;
    let start = Instant::now();

    engine.start(T0);
    engine.poll(T0 + cycles * 3000);

    let elapsed = start.elapsed();
    let rate = cycles as f64 / elapsed.as_secs_f64();

    println!("Ran {} cycles in {:?}", cycles, elapsed);
    println!("Rate: {:.0} cycles/second", rate);

    assert_eq!(engine.cycles_completed(), cycles);
    assert_eq!(engine.log().len(), 50);
    assert_eq!(engine.history().len(), 20);
    assert!(engine.metrics().is_within_bounds(MAX_CHANNELS));
}

#[test]
#[ignore]
fn stress_test_route_churn() {
    let mut engine = TransmissionEngine::new(SimulationConfig::default().with_seed(2)).unwrap();
    let keys = ["primary", "backup", "bridge"];

    engine.start(T0);
    for step in 1..=30_000u64 {
        engine.set_route(keys[(step % 3) as usize]);
        engine.set_channels((step % 12) as u32);
        engine.poll(T0 + step * 100);

        assert!(engine.metrics().is_within_bounds(MAX_CHANNELS));
        assert!(engine.is_running());
    }

    assert_eq!(engine.cycles_completed(), 1000);
}

#[test]
#[ignore]
fn stress_test_start_stop() {
    let mut engine = TransmissionEngine::new(SimulationConfig::default().with_seed(3)).unwrap();

    for i in 0..10_000u64 {
        let now = T0 + i * 700;
        engine.start(now);
        engine.poll(now + 600);
        engine.stop();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.pending_phases(), 0);
    }

    assert_eq!(engine.cycles_completed(), 0);
}
