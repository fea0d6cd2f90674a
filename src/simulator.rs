//! Simulated telemetry
//!
//! Stands in for real sensor ingestion. On every scheduling tick each athlete is picked
//! independently with a fixed probability; a picked athlete's four primary metrics each
//! drift by a uniform offset centred on zero, then get clamped back into their domain.
//!
//! The random source is always passed in, so a seeded generator replays the same drift.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricField, PrimaryMetrics};

/// Simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Chance that a given athlete is updated on a given tick
    pub selection_probability: f64,

    /// Half-width of the uniform drift applied to training load
    pub training_load_span: f64,

    /// Half-width of the uniform drift applied to sleep quality
    pub sleep_quality_span: f64,

    /// Half-width of the uniform drift applied to fatigue level
    pub fatigue_level_span: f64,

    /// Half-width of the uniform drift applied to heart rate variability
    pub heart_rate_variability_span: f64,

    /// Store simulated metrics as whole numbers
    pub round_to_whole: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            selection_probability: 0.2,
            training_load_span: 10.0,
            sleep_quality_span: 7.5,
            fatigue_level_span: 10.0,
            heart_rate_variability_span: 5.0,
            round_to_whole: true,
        }
    }
}

impl SimulationConfig {
    pub fn span(&self, field: MetricField) -> f64 {
        match field {
            MetricField::TrainingLoad => self.training_load_span,
            MetricField::SleepQuality => self.sleep_quality_span,
            MetricField::FatigueLevel => self.fatigue_level_span,
            MetricField::HeartRateVariability => self.heart_rate_variability_span,
        }
    }
}

/// Generates perturbed metric sets
#[derive(Debug, Clone, Default)]
pub struct MetricSimulator {
    config: SimulationConfig,
}

impl MetricSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        MetricSimulator { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Bernoulli draw deciding whether an athlete takes part in this tick
    pub fn is_selected<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        let p = self.config.selection_probability;
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        rng.gen_bool(p)
    }

    /// Apply one round of drift to every primary metric.
    ///
    /// Offsets are drawn in [`MetricField::ALL`] order so a seeded generator is
    /// reproducible.
    pub fn perturb<R: Rng + ?Sized>(&self, metrics: &PrimaryMetrics, rng: &mut R) -> PrimaryMetrics {
        let perturbed = MetricField::ALL.iter().fold(*metrics, |acc, field| {
            let span = self.config.span(*field);
            let offset = if span.is_finite() && span > 0.0 {
                rng.gen_range(-span..span)
            } else {
                0.0
            };
            acc.with(*field, acc.get(*field) + offset)
        });

        if self.config.round_to_whole {
            perturbed.rounded()
        } else {
            perturbed
        }
    }

    /// Selection followed by drift; `None` when the athlete sits this tick out
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        metrics: &PrimaryMetrics,
        rng: &mut R,
    ) -> Option<PrimaryMetrics> {
        if self.is_selected(rng) {
            Some(self.perturb(metrics, rng))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn always() -> MetricSimulator {
        MetricSimulator::with_config(SimulationConfig {
            selection_probability: 1.0,
            ..SimulationConfig::default()
        })
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let simulator = always();
        let base = PrimaryMetrics::default();

        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            assert_eq!(simulator.perturb(&base, &mut a), simulator.perturb(&base, &mut b));
        }
    }

    #[test]
    fn test_drift_is_bounded_and_clamped() {
        let simulator = MetricSimulator::with_config(SimulationConfig {
            round_to_whole: false,
            ..SimulationConfig::default()
        });
        let base = PrimaryMetrics::default();
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..500 {
            let next = simulator.perturb(&base, &mut rng);
            assert!(next.is_within_domain());
            assert!((next.training_load - base.training_load).abs() <= 10.0);
            assert!((next.sleep_quality - base.sleep_quality).abs() <= 7.5);
            assert!((next.fatigue_level - base.fatigue_level).abs() <= 10.0);
            assert!((next.heart_rate_variability - base.heart_rate_variability).abs() <= 5.0);
        }
    }

    #[test]
    fn test_drift_at_domain_edge_stays_in_domain() {
        let simulator = always();
        let edge = PrimaryMetrics::new(100.0, 40.0, 10.0, 100.0);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let next = simulator.perturb(&edge, &mut rng);
            assert!(next.is_within_domain());
            assert_eq!(next.training_load.fract(), 0.0);
        }
    }

    #[test]
    fn test_zero_spans_leave_metrics_untouched() {
        let simulator = MetricSimulator::with_config(SimulationConfig {
            selection_probability: 1.0,
            training_load_span: 0.0,
            sleep_quality_span: 0.0,
            fatigue_level_span: 0.0,
            heart_rate_variability_span: 0.0,
            round_to_whole: false,
        });
        let base = PrimaryMetrics::new(81.5, 62.0, 33.0, 70.0);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(simulator.simulate(&base, &mut rng), Some(base));
    }

    #[test]
    fn test_selection_rate() {
        let simulator = MetricSimulator::new();
        let mut rng = StdRng::seed_from_u64(2024);

        let picked = (0..10_000).filter(|_| simulator.is_selected(&mut rng)).count();
        // 20% +- 2 points
        assert!((1_800..=2_200).contains(&picked), "picked {}", picked);
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let never = MetricSimulator::with_config(SimulationConfig {
            selection_probability: -1.0,
            ..SimulationConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(5);
        assert!((0..100).all(|_| !never.is_selected(&mut rng)));

        let nan = MetricSimulator::with_config(SimulationConfig {
            selection_probability: f64::NAN,
            ..SimulationConfig::default()
        });
        assert!(nan.simulate(&PrimaryMetrics::default(), &mut rng).is_none());
    }
}
