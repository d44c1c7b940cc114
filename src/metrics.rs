//! Link metrics for the transmission engine
//!
//! This module holds the live metrics snapshot produced by each cycle and
//! the chart-ready history sample derived from it.

use serde::{Deserialize, Serialize};

/// Quality above this value is shown as nominal.
pub const NOMINAL_QUALITY_THRESHOLD: f64 = 0.95;

/// Default surface-code fidelity before the first cycle completes.
pub const DEFAULT_CORRECTION_FIDELITY: f64 = 0.95;

/// Live metrics snapshot.
///
/// The engine never edits fields of the live instance one by one; each phase
/// builds a new value and swaps it in whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Cost of provisioning an entangled pair (s). Zero once a cycle runs.
    pub setup_latency_seconds: f64,
    /// End-to-end transmit latency (s)
    pub transmit_latency_seconds: f64,
    /// Link quality in [0, 1]
    pub quality: f64,
    /// Share of successful transmissions in [0, 1]
    pub success_rate: f64,
    /// Channels engaged by the current run
    pub active_channels: u32,
    /// Decoder convergence in [0, 1]
    pub decoder_convergence: f64,
    /// Belief-propagation decoder iterations
    pub decoder_iterations: u32,
    /// Error-correction fidelity in [0, 1]
    pub error_correction_fidelity: f64,
    /// Flux multiplier (> 0)
    pub flux_factor: f64,
    /// Quantum bit error rate in [0, 1]
    pub error_rate: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            setup_latency_seconds: 0.0,
            transmit_latency_seconds: 0.0,
            quality: 1.0,
            success_rate: 1.0,
            active_channels: 0,
            decoder_convergence: 1.0,
            decoder_iterations: 0,
            error_correction_fidelity: DEFAULT_CORRECTION_FIDELITY,
            flux_factor: 1.0,
            error_rate: 0.0,
        }
    }
}

/// Display band for link quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityBand {
    Nominal,
    Degraded,
}

impl QualityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityBand::Nominal => "NOMINAL",
            QualityBand::Degraded => "DEGRADED",
        }
    }
}

impl Metrics {
    /// Create the all-default snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify current quality for display
    pub fn quality_band(&self) -> QualityBand {
        if self.quality > NOMINAL_QUALITY_THRESHOLD {
            QualityBand::Nominal
        } else {
            QualityBand::Degraded
        }
    }

    /// Whether every field lies in its documented domain
    pub fn is_within_bounds(&self, max_channels: u32) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        self.setup_latency_seconds >= 0.0
            && self.transmit_latency_seconds >= 0.0
            && unit(self.quality)
            && unit(self.success_rate)
            && self.active_channels <= max_channels
            && unit(self.decoder_convergence)
            && unit(self.error_correction_fidelity)
            && self.flux_factor > 0.0
            && unit(self.error_rate)
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== PQMS Link Metrics ===\n\n");
        report.push_str(&format!(
            "Setup latency: {:.3} s\n",
            self.setup_latency_seconds
        ));
        report.push_str(&format!(
            "Transmit latency: {:.3} s\n",
            self.transmit_latency_seconds
        ));
        report.push_str(&format!(
            "Quality: {:.1}% ({})\n",
            self.quality * 100.0,
            self.quality_band().as_str()
        ));
        report.push_str(&format!(
            "Success rate: {:.1}%\n",
            self.success_rate * 100.0
        ));
        report.push_str(&format!("Active channels: {}\n\n", self.active_channels));

        report.push_str(&format!(
            "Decoder: {} iterations, convergence {:.1}%\n",
            self.decoder_iterations,
            self.decoder_convergence * 100.0
        ));
        report.push_str(&format!(
            "Correction fidelity: {:.2}%, QBER: {:.3}%\n",
            self.error_correction_fidelity * 100.0,
            self.error_rate * 100.0
        ));
        report.push_str(&format!("Flux: {:.2}x\n", self.flux_factor));

        report
    }
}

/// Chart-ready snapshot of one completed cycle.
///
/// Probabilities are stored as percentages, latencies in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySample {
    /// Short `MM:SS` label
    pub time: String,
    /// Epoch milliseconds of the completion
    pub timestamp_ms: u64,
    pub setup_latency: f64,
    pub transmit_latency: f64,
    pub success_rate: f64,
    pub quality: f64,
    pub decoder_convergence: f64,
    pub error_correction_fidelity: f64,
    pub error_rate: f64,
    pub flux_factor: f64,
}

impl HistorySample {
    /// Project a metrics snapshot into chart units.
    pub fn from_metrics(time: impl Into<String>, timestamp_ms: u64, metrics: &Metrics) -> Self {
        Self {
            time: time.into(),
            timestamp_ms,
            setup_latency: metrics.setup_latency_seconds,
            transmit_latency: metrics.transmit_latency_seconds,
            success_rate: metrics.success_rate * 100.0,
            quality: metrics.quality * 100.0,
            decoder_convergence: metrics.decoder_convergence * 100.0,
            error_correction_fidelity: metrics.error_correction_fidelity * 100.0,
            error_rate: metrics.error_rate * 100.0,
            flux_factor: metrics.flux_factor,
        }
    }
}
