//! Synthetic metric model for a transmission cycle.
//!
//! The formulas are plausible-looking numbers, not physics. Randomness is
//! confined to [`CompletionDraw::sample`]; every other function here is
//! pure, so a hand-built draw gives exactly reproducible metrics.

use crate::config::ModelParams;
use crate::metrics::Metrics;
use rand::Rng;

/// Lower bound for the flux factor.
pub const MIN_FLUX_FACTOR: f64 = 1e-6;

/// Random inputs of one Complete phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionDraw {
    /// Pair age.
    pub age: f64,
    /// Multiplicative quality jitter.
    pub quality_jitter: f64,
    /// Transmit latency (s).
    pub latency: f64,
    /// Decoder iterations.
    pub decoder_iterations: u32,
    /// Flux jitter in [0, 1).
    pub flux_jitter: f64,
}

impl CompletionDraw {
    /// Draw every random input from its configured range.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, params: &ModelParams) -> Self {
        let iterations = rng
            .gen_range(params.decoder_iterations.low..params.decoder_iterations.high)
            .floor();

        Self {
            age: rng.gen_range(params.age.low..params.age.high),
            quality_jitter: rng.gen_range(params.quality_jitter.low..params.quality_jitter.high),
            latency: rng.gen_range(params.latency.low..params.latency.high),
            decoder_iterations: iterations.max(0.0) as u32,
            flux_jitter: rng.gen::<f64>(),
        }
    }
}

/// Everything the Complete phase derives.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// Replacement metrics snapshot.
    pub metrics: Metrics,
    /// exp(-decay_rate * age)
    pub decay_factor: f64,
    /// Detected errors before correction.
    pub num_errors: u32,
    /// Errors per transmitted qubit pair.
    pub correction_error_rate: f64,
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Metric derivations for a cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleModel {
    params: ModelParams,
}

impl CycleModel {
    pub fn new(params: ModelParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Provisional quality right after the swaps: `swap_fidelity^(len - 2)`.
    pub fn swap_quality(&self, route_len: usize) -> f64 {
        let hops = route_len.saturating_sub(2) as i32;
        unit(self.params.swap_fidelity.powi(hops))
    }

    /// Flux phase; drifts slowly with wall-clock time.
    pub fn flux_phase(&self, timestamp_ms: u64) -> f64 {
        timestamp_ms as f64 / self.params.flux_period_ms
    }

    /// Final metrics of a completed cycle.
    pub fn complete(
        &self,
        draw: &CompletionDraw,
        route_len: usize,
        channels: u32,
        timestamp_ms: u64,
    ) -> CycleOutcome {
        let p = &self.params;

        let decay_factor = (-p.decay_rate * draw.age).exp();
        let quality = unit(p.base_quality * decay_factor * draw.quality_jitter);

        let convergence =
            unit(1.0 - draw.decoder_iterations as f64 / p.max_decoder_iterations as f64);

        let num_errors = ((1.0 - quality) * p.error_scale).floor().max(0.0) as u32;
        let correction_error_rate = if route_len == 0 {
            0.0
        } else {
            unit(num_errors as f64 / (2 * route_len) as f64)
        };
        let fidelity = unit(1.0 - correction_error_rate * p.correction_damping);

        let flux = 1.0
            + self.flux_phase(timestamp_ms).sin() * draw.flux_jitter * p.flux_amplitude;

        let error_rate = unit(1.0 - quality * fidelity);

        CycleOutcome {
            metrics: Metrics {
                setup_latency_seconds: 0.0,
                transmit_latency_seconds: draw.latency.max(0.0),
                quality,
                success_rate: 1.0,
                active_channels: channels,
                decoder_convergence: convergence,
                decoder_iterations: draw.decoder_iterations,
                error_correction_fidelity: fidelity,
                flux_factor: flux.max(MIN_FLUX_FACTOR),
                error_rate,
            },
            decay_factor,
            num_errors,
            correction_error_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_draw() -> CompletionDraw {
        CompletionDraw {
            age: 6.0,
            quality_jitter: 0.99,
            latency: 0.05,
            decoder_iterations: 10,
            flux_jitter: 0.5,
        }
    }

    #[test]
    fn test_swap_quality_per_hop() {
        let model = CycleModel::default();
        assert_relative_eq!(model.swap_quality(2), 1.0);
        assert_relative_eq!(model.swap_quality(3), 0.995);
        assert_relative_eq!(model.swap_quality(4), 0.995 * 0.995);
        assert_relative_eq!(model.swap_quality(0), 1.0);
    }

    #[test]
    fn test_complete_exact_values() {
        let model = CycleModel::default();
        let outcome = model.complete(&fixed_draw(), 4, 10, 0);

        let decay = (-0.05_f64 * 6.0).exp();
        let quality = 0.995 * decay * 0.99;
        assert_relative_eq!(outcome.decay_factor, decay);
        assert_relative_eq!(outcome.metrics.quality, quality);

        // (1 - 0.7297...) * 5 = 1.35 -> 1 error over 8 pair slots
        assert_eq!(outcome.num_errors, 1);
        assert_relative_eq!(outcome.correction_error_rate, 1.0 / 8.0);

        let fidelity = 1.0 - 0.125 * 0.08;
        assert_relative_eq!(outcome.metrics.error_correction_fidelity, fidelity);
        assert_relative_eq!(outcome.metrics.error_rate, 1.0 - quality * fidelity);
        assert_relative_eq!(outcome.metrics.decoder_convergence, 0.8);
        assert_eq!(outcome.metrics.decoder_iterations, 10);
        assert_eq!(outcome.metrics.active_channels, 10);
        assert_eq!(outcome.metrics.setup_latency_seconds, 0.0);
        assert_eq!(outcome.metrics.success_rate, 1.0);
        // sin(0) = 0
        assert_relative_eq!(outcome.metrics.flux_factor, 1.0);
    }

    #[test]
    fn test_flux_follows_timestamp() {
        let model = CycleModel::default();
        let quarter_turn = (std::f64::consts::FRAC_PI_2 * 10_000.0) as u64;
        let outcome = model.complete(&fixed_draw(), 4, 10, quarter_turn);
        // 1 + ~1 * 0.5 * 0.5
        assert_relative_eq!(outcome.metrics.flux_factor, 1.25, epsilon = 1e-6);
    }

    #[test]
    fn test_sample_within_ranges() {
        let params = ModelParams::default();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let draw = CompletionDraw::sample(&mut rng, &params);
            assert!(params.age.contains(draw.age));
            assert!(params.quality_jitter.contains(draw.quality_jitter));
            assert!(params.latency.contains(draw.latency));
            assert!((5..20).contains(&draw.decoder_iterations));
            assert!((0.0..1.0).contains(&draw.flux_jitter));
        }
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let params = ModelParams::default();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);

        assert_eq!(
            CompletionDraw::sample(&mut a, &params),
            CompletionDraw::sample(&mut b, &params)
        );
    }

    #[test]
    fn test_outputs_stay_in_domain() {
        let model = CycleModel::default();
        let mut rng = StdRng::seed_from_u64(3);

        for i in 0..500u64 {
            let draw = CompletionDraw::sample(&mut rng, model.params());
            let outcome = model.complete(&draw, 3 + (i % 3) as usize, 10, i * 977);
            assert!(outcome.metrics.is_within_bounds(10));
            assert!(outcome.metrics.quality > 0.0);
        }
    }

    #[test]
    fn test_extreme_jitter_is_clamped() {
        let model = CycleModel::default();
        let draw = CompletionDraw {
            quality_jitter: 5.0,
            age: 0.0,
            ..fixed_draw()
        };
        let outcome = model.complete(&draw, 4, 10, 0);
        assert_eq!(outcome.metrics.quality, 1.0);
    }
}
