//! JSON export of an engine's current state.

use crate::clock;
use crate::config::EngineConfig;
use crate::engine::TransmissionEngine;
use crate::journal::LogEntry;
use crate::metrics::{HistorySample, Metrics};
use serde::{Deserialize, Serialize};

/// Export document, one file per capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Capture time, RFC 3339.
    pub timestamp: String,
    pub metrics: Metrics,
    /// Oldest first.
    pub metrics_history: Vec<HistorySample>,
    /// Newest first.
    pub logs: Vec<LogEntry>,
    pub configuration: EngineConfig,
}

impl ExportDocument {
    /// Capture the engine as of `now_ms`.
    pub fn capture(engine: &TransmissionEngine, now_ms: u64) -> Self {
        Self {
            timestamp: clock::iso_timestamp(now_ms),
            metrics: engine.metrics().clone(),
            metrics_history: engine.history().to_vec(),
            logs: engine.log().to_vec(),
            configuration: engine.settings().clone(),
        }
    }

    /// Conventional file name for a capture at `now_ms`.
    pub fn file_name(now_ms: u64) -> String {
        format!("pqms-export-{}.json", now_ms)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
