//! Simulation configuration.

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::journal::DEFAULT_LOG_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest channel count the engine accepts.
pub const MAX_CHANNELS: u32 = 10;

/// Master configuration for a transmission engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Phase offsets from cycle start.
    pub timing: PhaseTiming,

    /// Constants of the synthetic metric model.
    pub model: ModelParams,

    /// Store bounds.
    pub capacity: StoreCapacity,

    /// Upper clamp for the channel count.
    pub max_channels: u32,

    /// Pre-provisioned entangled pairs per channel.
    pub pool_pairs_per_channel: u32,

    /// Route key selected at startup.
    pub default_route: String,

    /// Channel count at startup.
    pub default_channels: u32,

    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timing: PhaseTiming::default(),
            model: ModelParams::default(),
            capacity: StoreCapacity::default(),
            max_channels: MAX_CHANNELS,
            pool_pairs_per_channel: 5,
            default_route: "primary".to_string(),
            default_channels: MAX_CHANNELS,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set phase timing.
    pub fn with_timing(mut self, timing: PhaseTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set startup route key.
    pub fn with_route(mut self, key: impl Into<String>) -> Self {
        self.default_route = key.into();
        self
    }

    /// Set startup channel count.
    pub fn with_channels(mut self, channels: u32) -> Self {
        self.default_channels = channels;
        self
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check ranges and positive quantities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.cycle_period_ms == 0 {
            return Err(ConfigError::Zero("timing.cycle_period_ms"));
        }
        if self.max_channels > MAX_CHANNELS {
            return Err(ConfigError::TooLarge {
                name: "max_channels",
                value: u64::from(self.max_channels),
                max: u64::from(MAX_CHANNELS),
            });
        }
        if self.capacity.log_entries == 0 {
            return Err(ConfigError::Zero("capacity.log_entries"));
        }
        if self.capacity.history_samples == 0 {
            return Err(ConfigError::Zero("capacity.history_samples"));
        }
        self.model.validate()
    }
}

/// Phase offsets, all measured from the start of the cycle.
///
/// Offsets need not be nested: a Complete that lands after the next
/// cycle's start is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTiming {
    pub entanglement_delay_ms: u64,
    pub swap_delay_ms: u64,
    pub completion_delay_ms: u64,
    pub cycle_period_ms: u64,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            entanglement_delay_ms: 100,
            swap_delay_ms: 500,
            completion_delay_ms: 1000,
            cycle_period_ms: 3000,
        }
    }
}

/// Half-open uniform range `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub low: f64,
    pub high: f64,
}

impl UniformRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value < self.high
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.low.is_finite() && self.high.is_finite() && self.low < self.high {
            Ok(())
        } else {
            Err(ConfigError::InvalidRange {
                name,
                low: self.low,
                high: self.high,
            })
        }
    }
}

/// Constants of the synthetic metric model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Quality retained per entanglement swap.
    pub swap_fidelity: f64,
    /// Base quality before decay.
    pub base_quality: f64,
    /// Pair age at transmission.
    pub age: UniformRange,
    /// Exponential decay rate over age.
    pub decay_rate: f64,
    /// Multiplicative quality jitter.
    pub quality_jitter: UniformRange,
    /// Transmit latency in seconds.
    pub latency: UniformRange,
    /// Decoder iterations, integer part of a draw in this range.
    pub decoder_iterations: UniformRange,
    /// Iteration budget for convergence.
    pub max_decoder_iterations: u32,
    /// Errors per unit of quality loss.
    pub error_scale: f64,
    /// Fidelity penalty per unit error rate.
    pub correction_damping: f64,
    /// Flux swing around 1.
    pub flux_amplitude: f64,
    /// Divisor turning epoch ms into the flux phase.
    pub flux_period_ms: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            swap_fidelity: 0.995,
            base_quality: 0.995,
            age: UniformRange::new(5.0, 7.0),
            decay_rate: 0.05,
            quality_jitter: UniformRange::new(0.98, 1.0),
            latency: UniformRange::new(0.04, 0.06),
            decoder_iterations: UniformRange::new(5.0, 20.0),
            max_decoder_iterations: 50,
            error_scale: 5.0,
            correction_damping: 0.08,
            flux_amplitude: 0.5,
            flux_period_ms: 10_000.0,
        }
    }
}

impl ModelParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.age.check("model.age")?;
        self.quality_jitter.check("model.quality_jitter")?;
        self.latency.check("model.latency")?;
        self.decoder_iterations.check("model.decoder_iterations")?;
        if self.max_decoder_iterations == 0 {
            return Err(ConfigError::Zero("model.max_decoder_iterations"));
        }
        if self.flux_period_ms <= 0.0 {
            return Err(ConfigError::Zero("model.flux_period_ms"));
        }
        Ok(())
    }
}

/// Store bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreCapacity {
    pub log_entries: usize,
    pub history_samples: usize,
}

impl Default for StoreCapacity {
    fn default() -> Self {
        Self {
            log_entries: DEFAULT_LOG_CAPACITY,
            history_samples: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Externally supplied run configuration, read fresh every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Selected route key.
    #[serde(rename = "path")]
    pub route_key: String,
    /// Channel count in `[0, max_channels]`.
    pub channels: u32,
    /// Run flag.
    #[serde(skip)]
    pub running: bool,
}

impl EngineConfig {
    pub fn new(route_key: impl Into<String>, channels: u32) -> Self {
        Self {
            route_key: route_key.into(),
            channels,
            running: false,
        }
    }
}
