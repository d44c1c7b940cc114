//! TransmissionEngine - staged transmission cycle state machine.
//!
//! A run is bounded by [`TransmissionEngine::start`] and
//! [`TransmissionEngine::stop`]. Each cycle resolves the selected route and
//! then schedules four independent tasks, all relative to the cycle start:
//!
//! ```text
//! t+0     RouteResolved      route, active channels
//! t+100   EntanglementReady  setup latency = 0
//! t+500   SwapPerformed      provisional quality = 0.995^hops
//! t+1000  Complete           final metrics, history sample
//! t+3000  next RouteResolved (if still running)
//! ```
//!
//! The engine never reads the system clock. Callers hand in epoch
//! milliseconds and call [`TransmissionEngine::poll`] to fire due phases.
//! Stop and reset retire the current run token and purge the queue, so no
//! task of an old run can touch state afterwards.

use crate::clock;
use crate::config::{EngineConfig, SimulationConfig};
use crate::error::Result;
use crate::history::HistoryStore;
use crate::journal::{LogEntry, TransmissionLog};
use crate::metrics::{HistorySample, Metrics};
use crate::model::{CompletionDraw, CycleModel};
use crate::scheduler::{DelayedQueue, RunToken};
use crate::topology::{Route, Topology};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;

/// Engine state. Reflects the most recent transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EngineState {
    Idle,
    RouteResolved,
    EntanglementReady,
    SwapPerformed,
    Complete,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "IDLE",
            EngineState::RouteResolved => "ROUTE_RESOLVED",
            EngineState::EntanglementReady => "ENTANGLEMENT_READY",
            EngineState::SwapPerformed => "SWAP_PERFORMED",
            EngineState::Complete => "COMPLETE",
        }
    }
}

/// What a cycle captured when it began.
#[derive(Debug)]
struct CycleContext {
    number: u64,
    route: Route,
    channels: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    EntanglementReady,
    SwapPerformed,
    Complete,
    NextCycle,
}

#[derive(Debug, Clone)]
struct PhaseTask {
    phase: Phase,
    cycle: Arc<CycleContext>,
}

/// Read-only copy of everything the presentation layer consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub running: bool,
    pub configuration: EngineConfig,
    pub active_route: Vec<String>,
    pub metrics: Metrics,
    pub logs: Vec<LogEntry>,
    pub history: Vec<HistorySample>,
    pub cycles_completed: u64,
}

/// Main transmission engine.
pub struct TransmissionEngine {
    config: SimulationConfig,
    topology: Arc<Topology>,
    model: CycleModel,
    rng: StdRng,

    /// Route key, channel count and run flag.
    settings: EngineConfig,
    state: EngineState,
    active_route: Option<Route>,
    metrics: Metrics,
    log: TransmissionLog,
    history: HistoryStore,

    queue: DelayedQueue<PhaseTask>,
    /// Token of the current run; tasks stamped otherwise are stale.
    run: RunToken,
    cycles_started: u64,
    cycles_completed: u64,
}

impl TransmissionEngine {
    /// Create an engine over the Erde-Mars topology.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let topology = Topology::earth_mars()?;
        Self::with_topology(Arc::new(topology), config)
    }

    /// Create an engine over a caller-supplied topology.
    pub fn with_topology(topology: Arc<Topology>, config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let settings = EngineConfig::new(
            config.default_route.clone(),
            config.default_channels.min(config.max_channels),
        );

        Ok(Self {
            model: CycleModel::new(config.model.clone()),
            log: TransmissionLog::new(config.capacity.log_entries),
            history: HistoryStore::new(config.capacity.history_samples),
            rng,
            settings,
            state: EngineState::Idle,
            active_route: None,
            metrics: Metrics::default(),
            queue: DelayedQueue::new(),
            run: RunToken::default(),
            cycles_started: 0,
            cycles_completed: 0,
            topology,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Control signals
    // ------------------------------------------------------------------

    /// Start a run and enter the first RouteResolved phase. No-op if a run
    /// is already active.
    pub fn start(&mut self, now_ms: u64) {
        if self.settings.running {
            debug!("start ignored, run {} active", self.run.value());
            return;
        }

        self.run = self.run.next();
        self.settings.running = true;
        info!(
            "run {} started: route={}, channels={}",
            self.run.value(),
            self.settings.route_key,
            self.settings.channels
        );

        self.log.info("Transmission engine started", now_ms);
        self.log.info(
            format!(
                "Proactive mesh builder initialised (capacity: {} pairs)",
                u64::from(self.settings.channels) * u64::from(self.config.pool_pairs_per_channel)
            ),
            now_ms,
        );

        self.begin_cycle(now_ms);
    }

    /// Stop the run. Pending phases are dropped and the engine settles to
    /// Idle at once; metrics other than the channel count keep their values.
    pub fn stop(&mut self) {
        if !self.settings.running && self.state == EngineState::Idle {
            return;
        }

        let purged = self.retire_run();
        info!("run stopped, {} pending phases dropped", purged);
        self.settle_idle();
    }

    /// Force Idle, clear both stores and restore default metrics.
    pub fn reset(&mut self, now_ms: u64) {
        self.queue.clear();
        self.settings.running = false;
        self.run = self.run.next();

        self.state = EngineState::Idle;
        self.active_route = None;
        self.metrics = Metrics::default();
        self.log.clear();
        self.history.clear();
        info!("engine reset");

        self.log.info("System reset", now_ms);
    }

    /// Select the route for the next cycle.
    pub fn set_route(&mut self, key: impl Into<String>) {
        self.settings.route_key = key.into();
    }

    /// Set the channel count for the next cycle, clamped to the maximum.
    /// Returns the stored value.
    pub fn set_channels(&mut self, channels: u32) -> u32 {
        self.settings.channels = channels.min(self.config.max_channels);
        self.settings.channels
    }

    /// Fire every phase due at `now_ms`. Returns how many ran.
    pub fn poll(&mut self, now_ms: u64) -> usize {
        let mut fired = 0;

        while let Some(task) = self.queue.pop_due(now_ms) {
            if task.run != self.run {
                debug!(
                    "dropping stale {:?} of run {}",
                    task.payload.phase,
                    task.run.value()
                );
                continue;
            }
            self.run_phase(task.payload, task.due_ms);
            fired += 1;
        }

        fired
    }

    // ------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------

    fn begin_cycle(&mut self, now_ms: u64) {
        let route = match self.topology.resolve_route(&self.settings.route_key) {
            Ok(route) => route,
            Err(e) => {
                warn!("halting run {}: {}", self.run.value(), e);
                self.log.error(format!("Route resolution failed: {}", e), now_ms);
                self.retire_run();
                self.settle_idle();
                return;
            }
        };

        self.cycles_started += 1;
        let channels = self.settings.channels;

        self.state = EngineState::RouteResolved;
        self.metrics = Metrics {
            active_channels: channels,
            ..self.metrics.clone()
        };
        self.log.info(
            format!("Routing path computed: {}", route.describe()),
            now_ms,
        );
        debug!(
            "cycle {} resolved {} ({} nodes)",
            self.cycles_started,
            route.key,
            route.len()
        );
        self.active_route = Some(route.clone());

        let cycle = Arc::new(CycleContext {
            number: self.cycles_started,
            route,
            channels,
        });
        let timing = self.config.timing;
        let plan = [
            (timing.entanglement_delay_ms, Phase::EntanglementReady),
            (timing.swap_delay_ms, Phase::SwapPerformed),
            (timing.completion_delay_ms, Phase::Complete),
            (timing.cycle_period_ms, Phase::NextCycle),
        ];
        for (offset, phase) in plan {
            self.queue.schedule(
                now_ms.saturating_add(offset),
                self.run,
                PhaseTask {
                    phase,
                    cycle: Arc::clone(&cycle),
                },
            );
        }
    }

    fn run_phase(&mut self, task: PhaseTask, at_ms: u64) {
        debug!("cycle {} {:?} at {}", task.cycle.number, task.phase, at_ms);

        match task.phase {
            Phase::EntanglementReady => {
                self.state = EngineState::EntanglementReady;
                self.metrics = Metrics {
                    setup_latency_seconds: 0.0,
                    ..self.metrics.clone()
                };
                self.log
                    .info("Entangled pair drawn from hot-standby pool", at_ms);
            }
            Phase::SwapPerformed => {
                let route = &task.cycle.route;
                self.state = EngineState::SwapPerformed;
                self.metrics = Metrics {
                    quality: self.model.swap_quality(route.len()),
                    ..self.metrics.clone()
                };
                self.log.info(
                    format!("Entanglement swap performed across {} relay(s)", route.hops()),
                    at_ms,
                );
            }
            Phase::Complete => self.complete_cycle(&task.cycle, at_ms),
            Phase::NextCycle => {
                if self.settings.running {
                    self.begin_cycle(at_ms);
                }
            }
        }
    }

    fn complete_cycle(&mut self, cycle: &CycleContext, at_ms: u64) {
        let draw = CompletionDraw::sample(&mut self.rng, self.model.params());
        let outcome = self
            .model
            .complete(&draw, cycle.route.len(), cycle.channels, at_ms);
        let m = outcome.metrics;

        self.state = EngineState::Complete;
        self.history.push(HistorySample::from_metrics(
            clock::chart_label(at_ms),
            at_ms,
            &m,
        ));
        self.cycles_completed += 1;

        self.log.success(
            format!(
                "Transmission successful! Final quality: {:.1}%",
                m.quality * 100.0
            ),
            at_ms,
        );
        self.log.info(
            format!(
                "BP decoder: {} iterations, convergence: {:.1}%",
                m.decoder_iterations,
                m.decoder_convergence * 100.0
            ),
            at_ms,
        );
        self.log.info(
            format!(
                "Surface code fidelity: {:.2}%, QBER: {:.3}%",
                m.error_correction_fidelity * 100.0,
                m.error_rate * 100.0
            ),
            at_ms,
        );
        self.log.info(
            format!(
                "Flux: {:.2}x, latency: {:.3}s",
                m.flux_factor, m.transmit_latency_seconds
            ),
            at_ms,
        );

        self.metrics = m;
    }

    /// Drop the current run's tasks and move to a fresh token.
    fn retire_run(&mut self) -> usize {
        self.settings.running = false;
        let purged = self.queue.cancel_run(self.run);
        self.run = self.run.next();
        purged
    }

    fn settle_idle(&mut self) {
        self.state = EngineState::Idle;
        self.active_route = None;
        self.metrics = Metrics {
            active_channels: 0,
            ..self.metrics.clone()
        };
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.settings.running
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn active_route(&self) -> Option<&Route> {
        self.active_route.as_ref()
    }

    /// Active route node ids; empty when Idle.
    pub fn active_path(&self) -> &[String] {
        self.active_route
            .as_ref()
            .map(|r| r.nodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn log(&self) -> &TransmissionLog {
        &self.log
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Current route key, channel count and run flag.
    pub fn settings(&self) -> &EngineConfig {
        &self.settings
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn cycles_started(&self) -> u64 {
        self.cycles_started
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// When the next phase is due, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.next_due()
    }

    pub fn pending_phases(&self) -> usize {
        self.queue.len()
    }

    /// Owned copy of everything a reader needs.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            running: self.settings.running,
            configuration: self.settings.clone(),
            active_route: self.active_path().to_vec(),
            metrics: self.metrics.clone(),
            logs: self.log.to_vec(),
            history: self.history.to_vec(),
            cycles_completed: self.cycles_completed,
        }
    }
}
