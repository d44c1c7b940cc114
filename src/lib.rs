//! # PQMS - Proactive Quantum Mesh transmission simulator
//!
//! Simulates staged transmission cycles over a small Erde-Mars relay mesh
//! and produces synthetic link metrics for display.
//!
//! ## Key Features
//!
//! - **Staged Cycles**: Route, entanglement, swap and completion phases on a fixed cadence
//! - **Selectable Routes**: Primary, backup and bridge paths through relay nodes
//! - **Synthetic Metrics**: Quality, decoder, fidelity and flux figures per cycle
//! - **Bounded Stores**: Newest-first transmission log and chronological history
//!
//! ## Quick Start
//!
//! ```rust
//! use pqms::{SimulationConfig, TransmissionEngine, EngineState};
//!
//! let mut engine = TransmissionEngine::new(SimulationConfig::default().with_seed(42)).unwrap();
//!
//! // Time is supplied by the caller
//! let t0 = 1_706_745_600_000;
//! engine.start(t0);
//! assert_eq!(engine.state(), EngineState::RouteResolved);
//!
//! // Fire every phase due by t0 + 1s
//! engine.poll(t0 + 1000);
//! assert_eq!(engine.state(), EngineState::Complete);
//! assert_eq!(engine.history().len(), 1);
//!
//! engine.stop();
//! assert_eq!(engine.state(), EngineState::Idle);
//! ```
//!
//! ## Modules
//!
//! - [`topology`]: Nodes, links and named routes
//! - [`engine`]: Transmission cycle state machine
//! - [`model`]: Synthetic metric derivations
//! - [`scheduler`]: Delayed task queue with run cancellation
//! - [`metrics`]: Link metrics and history samples
//! - [`journal`]: Bounded transmission log
//! - [`history`]: Sliding metric history
//! - [`export`]: JSON export document

// Modules
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod journal;
pub mod metrics;
pub mod model;
pub mod scheduler;
pub mod topology;

// Re-exports for convenient access
pub use config::{
    EngineConfig, ModelParams, PhaseTiming, SimulationConfig, StoreCapacity, UniformRange,
    MAX_CHANNELS,
};
pub use engine::{EngineSnapshot, EngineState, TransmissionEngine};
pub use error::{ConfigError, MeshError, Result, RouteError, TopologyError};
pub use export::ExportDocument;
pub use history::HistoryStore;
pub use journal::{LogEntry, LogSeverity, TransmissionLog};
pub use metrics::{HistorySample, Metrics, QualityBand};
pub use model::{CompletionDraw, CycleModel, CycleOutcome};
pub use scheduler::{DelayedQueue, RunToken};
pub use topology::{Link, Node, NodeKind, Route, Topology, ERDE, MARS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
