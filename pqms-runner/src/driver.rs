// PQMS Runner - Engine driver loop
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Drives a [`TransmissionEngine`] from wall-clock time.
//!
//! The engine sits behind a `tokio::sync::RwLock`; the loop takes the write
//! lock only for one `poll`, so readers always see whole phases.

use pqms::{clock, LogEntry, LogSeverity, TransmissionEngine};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Configuration for a driven run.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Route key for the run.
    pub route: String,
    /// Channel count for the run.
    pub channels: u32,
    /// Poll interval.
    pub tick: Duration,
    /// Stop after this many completed cycles.
    pub max_cycles: Option<u64>,
    /// Stop after this much wall time.
    pub max_duration: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            route: "primary".to_string(),
            channels: pqms::MAX_CHANNELS,
            tick: Duration::from_millis(50),
            max_cycles: None,
            max_duration: None,
        }
    }
}

/// Live counters, readable without the engine lock.
#[derive(Debug)]
pub struct DriverState {
    /// Whether the loop should keep going.
    pub running: AtomicBool,
    /// Polls performed.
    pub ticks: AtomicUsize,
    /// Phases fired across all polls.
    pub phases: AtomicUsize,
    /// Completed cycles as of the last poll.
    pub cycles_completed: AtomicU64,
    /// Last log sequence number mirrored to tracing.
    pub last_seq: AtomicU64,
}

impl Default for DriverState {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            ticks: AtomicUsize::new(0),
            phases: AtomicUsize::new(0),
            cycles_completed: AtomicU64::new(0),
            last_seq: AtomicU64::new(0),
        }
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    CycleLimit,
    Deadline,
    Interrupted,
    EngineHalted,
}

/// Outcome of a driven run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub reason: StopReason,
    pub cycles_completed: u64,
    pub ticks: usize,
    pub phases: usize,
    pub elapsed_ms: u64,
}

/// Owns the shared engine and runs the poll loop.
pub struct SimulationDriver {
    config: DriverConfig,
    state: Arc<DriverState>,
    engine: Arc<RwLock<TransmissionEngine>>,
}

impl SimulationDriver {
    /// Create a driver armed to run. A [`stop`](Self::stop) issued before
    /// [`run`](Self::run) is honoured.
    pub fn new(engine: TransmissionEngine, config: DriverConfig) -> Self {
        let state = DriverState::default();
        state.running.store(true, Ordering::SeqCst);
        Self {
            config,
            state: Arc::new(state),
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    /// Shared counters.
    pub fn state(&self) -> Arc<DriverState> {
        Arc::clone(&self.state)
    }

    /// Shared engine handle.
    pub fn engine(&self) -> Arc<RwLock<TransmissionEngine>> {
        Arc::clone(&self.engine)
    }

    /// Run until a bound is hit, the engine halts, or [`stop`](Self::stop)
    /// is called. The engine is stopped before returning.
    pub async fn run(&self) -> RunSummary {
        let started = Instant::now();

        if !self.state.running.load(Ordering::SeqCst) {
            info!("Stop requested before start, engine not started");
            return RunSummary {
                reason: StopReason::Interrupted,
                cycles_completed: 0,
                ticks: 0,
                phases: 0,
                elapsed_ms: 0,
            };
        }

        {
            let mut engine = self.engine.write().await;
            engine.set_route(self.config.route.clone());
            let channels = engine.set_channels(self.config.channels);
            info!(
                "Starting run: route={}, channels={}, tick={:?}",
                self.config.route, channels, self.config.tick
            );
            engine.start(clock::now_ms());
            self.mirror_log(&engine);
        }

        let mut ticker = interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            ticker.tick().await;

            if !self.state.running.load(Ordering::SeqCst) {
                break StopReason::Interrupted;
            }

            let (completed, halted) = {
                let mut engine = self.engine.write().await;
                let fired = engine.poll(clock::now_ms());
                self.state.phases.fetch_add(fired, Ordering::SeqCst);
                self.mirror_log(&engine);
                (engine.cycles_completed(), !engine.is_running())
            };

            self.state.ticks.fetch_add(1, Ordering::SeqCst);
            self.state
                .cycles_completed
                .store(completed, Ordering::SeqCst);

            if halted {
                break StopReason::EngineHalted;
            }
            if self.config.max_cycles.map_or(false, |max| completed >= max) {
                break StopReason::CycleLimit;
            }
            if self
                .config
                .max_duration
                .map_or(false, |max| started.elapsed() >= max)
            {
                break StopReason::Deadline;
            }
        };

        {
            let mut engine = self.engine.write().await;
            engine.stop();
            self.mirror_log(&engine);
        }
        self.state.running.store(false, Ordering::SeqCst);

        let summary = RunSummary {
            reason,
            cycles_completed: self.state.cycles_completed.load(Ordering::SeqCst),
            ticks: self.state.ticks.load(Ordering::SeqCst),
            phases: self.state.phases.load(Ordering::SeqCst),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Run finished ({:?}): {} cycles in {}ms",
            summary.reason, summary.cycles_completed, summary.elapsed_ms
        );
        summary
    }

    /// Ask the loop to end at its next tick.
    pub fn stop(&self) {
        self.state.running.store(false, Ordering::SeqCst);
    }

    /// Forward log entries the driver has not seen yet, oldest first.
    fn mirror_log(&self, engine: &TransmissionEngine) {
        let after = self.state.last_seq.load(Ordering::SeqCst);
        let entries = engine.log().entries_since(after);
        for entry in &entries {
            emit(entry);
        }
        if let Some(last) = entries.last() {
            self.state.last_seq.store(last.seq, Ordering::SeqCst);
        }
    }
}

fn emit(entry: &LogEntry) {
    match entry.severity {
        LogSeverity::Info => info!(target: "pqms::journal", seq = entry.seq, "{}", entry.message),
        LogSeverity::Success => {
            info!(target: "pqms::journal", seq = entry.seq, "[OK] {}", entry.message)
        }
        LogSeverity::Warning => warn!(target: "pqms::journal", seq = entry.seq, "{}", entry.message),
        LogSeverity::Error => error!(target: "pqms::journal", seq = entry.seq, "{}", entry.message),
    }
    debug!("mirrored log entry {} at {}", entry.seq, entry.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqms::{EngineState, PhaseTiming, SimulationConfig};

    fn fast_engine(seed: u64) -> TransmissionEngine {
        let timing = PhaseTiming {
            entanglement_delay_ms: 5,
            swap_delay_ms: 10,
            completion_delay_ms: 20,
            cycle_period_ms: 40,
        };
        TransmissionEngine::new(
            SimulationConfig::default()
                .with_seed(seed)
                .with_timing(timing),
        )
        .unwrap()
    }

    fn fast_config() -> DriverConfig {
        DriverConfig {
            tick: Duration::from_millis(5),
            max_duration: Some(Duration::from_secs(10)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_runs_until_cycle_limit() {
        let config = DriverConfig {
            max_cycles: Some(2),
            ..fast_config()
        };
        let driver = SimulationDriver::new(fast_engine(1), config);

        let summary = driver.run().await;

        assert_eq!(summary.reason, StopReason::CycleLimit);
        assert!(summary.cycles_completed >= 2);
        assert!(summary.phases >= 6);

        let engine = driver.engine();
        let engine = engine.read().await;
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.history().len() >= 2);
        assert!(!driver.state().running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unknown_route_halts() {
        let config = DriverConfig {
            route: "sideways".to_string(),
            ..fast_config()
        };
        let driver = SimulationDriver::new(fast_engine(2), config);

        let summary = driver.run().await;

        assert_eq!(summary.reason, StopReason::EngineHalted);
        assert_eq!(summary.cycles_completed, 0);
        let engine = driver.engine();
        assert_eq!(engine.read().await.log().count(LogSeverity::Error), 1);
    }

    #[tokio::test]
    async fn test_deadline() {
        let config = DriverConfig {
            max_duration: Some(Duration::from_millis(30)),
            ..fast_config()
        };
        let driver = SimulationDriver::new(fast_engine(3), config);

        let summary = driver.run().await;
        assert_eq!(summary.reason, StopReason::Deadline);
    }

    #[tokio::test]
    async fn test_stop_from_another_task() {
        let driver = Arc::new(SimulationDriver::new(fast_engine(4), fast_config()));

        let handle = {
            let driver = Arc::clone(&driver);
            tokio::spawn(async move { driver.run().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        driver.stop();

        let summary = handle.await.unwrap();
        assert_eq!(summary.reason, StopReason::Interrupted);
    }

    #[tokio::test]
    async fn test_stop_before_run_is_honoured() {
        let driver = SimulationDriver::new(fast_engine(6), fast_config());
        assert!(driver.state().running.load(Ordering::SeqCst));

        driver.stop();
        let summary = driver.run().await;

        assert_eq!(summary.reason, StopReason::Interrupted);
        assert_eq!(summary.ticks, 0);
        let engine = driver.engine();
        let engine = engine.read().await;
        assert!(!engine.is_running());
        assert!(engine.log().is_empty());
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[tokio::test]
    async fn test_log_mirroring_tracks_sequence() {
        let config = DriverConfig {
            max_cycles: Some(1),
            ..fast_config()
        };
        let driver = SimulationDriver::new(fast_engine(5), config);
        driver.run().await;

        let engine = driver.engine();
        let last = engine.read().await.log().last_seq();
        assert_eq!(driver.state().last_seq.load(Ordering::SeqCst), last);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = RunSummary {
            reason: StopReason::CycleLimit,
            cycles_completed: 3,
            ticks: 10,
            phases: 12,
            elapsed_ms: 500,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["reason"], "cycle_limit");
        assert_eq!(json["cycles_completed"], 3);
    }
}
