//! Health score derivation
//!
//! The health score is the athlete-facing number: `round(100 - 0.6 * injury_risk)`.
//! Across the 5-100 injury risk range it spans 97 down to 40.

use crate::metrics::HEALTH_SCORE_RANGE;

const RISK_PENALTY: f64 = 0.6;

/// Stateless health score deriver
pub struct ScoreDeriver;

impl ScoreDeriver {
    /// Whole-number health score for an injury risk value
    pub fn health_score(injury_risk: f64) -> u8 {
        let score = (100.0 - injury_risk * RISK_PENALTY).round();
        HEALTH_SCORE_RANGE.clamp(score) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_range_endpoints() {
        assert_eq!(ScoreDeriver::health_score(5.0), 97);
        assert_eq!(ScoreDeriver::health_score(100.0), 40);
    }

    #[test]
    fn test_half_rounds_up() {
        // 100 - 67.5 * 0.6 = 59.5
        assert_eq!(ScoreDeriver::health_score(67.5), 60);
        // 100 - 41.5 * 0.6 = 75.1
        assert_eq!(ScoreDeriver::health_score(41.5), 75);
    }

    proptest! {
        #[test]
        fn test_monotonically_non_increasing(
            risk in 5.0f64..100.0,
            delta in 0.0f64..20.0,
        ) {
            let higher = (risk + delta).min(100.0);
            prop_assert!(ScoreDeriver::health_score(higher) <= ScoreDeriver::health_score(risk));
        }

        #[test]
        fn test_score_within_bounds(risk in 5.0f64..=100.0) {
            let score = ScoreDeriver::health_score(risk);
            prop_assert!((40..=97).contains(&score));
        }
    }
}
