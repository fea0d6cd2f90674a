//! Athlete metric domain
//!
//! Every biometric field an athlete carries is bounded. Inputs are never rejected for
//! being out of range; they are clamped into the field's domain before any score is
//! derived from them.
//!
//! | Field                   | Range    | Set by             |
//! |-------------------------|----------|--------------------|
//! | training load           | 50-100   | simulator / edit   |
//! | sleep quality           | 40-100   | simulator / edit   |
//! | fatigue level           | 10-100   | simulator / edit   |
//! | heart rate variability  | 40-100   | simulator / edit   |
//! | injury risk             | 5-100    | derived only       |
//! | health score            | 0-100    | derived only       |

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::HealthError;
use crate::risk::RiskCalculator;
use crate::score::ScoreDeriver;

/// Closed numeric interval a metric must stay inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    pub const fn new(min: f64, max: f64) -> Self {
        MetricRange { min, max }
    }

    /// Clamp a value into the range. NaN collapses to the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const TRAINING_LOAD_RANGE: MetricRange = MetricRange::new(50.0, 100.0);
pub const SLEEP_QUALITY_RANGE: MetricRange = MetricRange::new(40.0, 100.0);
pub const FATIGUE_LEVEL_RANGE: MetricRange = MetricRange::new(10.0, 100.0);
pub const HRV_RANGE: MetricRange = MetricRange::new(40.0, 100.0);
pub const INJURY_RISK_RANGE: MetricRange = MetricRange::new(5.0, 100.0);
pub const HEALTH_SCORE_RANGE: MetricRange = MetricRange::new(0.0, 100.0);

/// The four metrics a caller (or the simulator) may change directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    TrainingLoad,
    SleepQuality,
    FatigueLevel,
    HeartRateVariability,
}

impl MetricField {
    /// All editable fields, in the order the simulator draws perturbations
    pub const ALL: [MetricField; 4] = [
        MetricField::TrainingLoad,
        MetricField::SleepQuality,
        MetricField::FatigueLevel,
        MetricField::HeartRateVariability,
    ];

    pub fn range(&self) -> MetricRange {
        match self {
            MetricField::TrainingLoad => TRAINING_LOAD_RANGE,
            MetricField::SleepQuality => SLEEP_QUALITY_RANGE,
            MetricField::FatigueLevel => FATIGUE_LEVEL_RANGE,
            MetricField::HeartRateVariability => HRV_RANGE,
        }
    }

    /// Canonical field name used in edits and serialized records
    pub fn name(&self) -> &'static str {
        match self {
            MetricField::TrainingLoad => "trainingLoad",
            MetricField::SleepQuality => "sleepQuality",
            MetricField::FatigueLevel => "fatigueLevel",
            MetricField::HeartRateVariability => "heartRateVariability",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MetricField {
    type Err = HealthError;

    /// Accepts camelCase, snake_case and kebab-case spellings, plus the
    /// `recentTrainingLoad` and `hrv` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "trainingload" | "recenttrainingload" => Ok(MetricField::TrainingLoad),
            "sleepquality" => Ok(MetricField::SleepQuality),
            "fatiguelevel" => Ok(MetricField::FatigueLevel),
            "heartratevariability" | "hrv" => Ok(MetricField::HeartRateVariability),
            _ => Err(HealthError::InvalidField {
                field: s.to_string(),
            }),
        }
    }
}

/// Directly editable metrics for one athlete
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryMetrics {
    pub training_load: f64,
    pub sleep_quality: f64,
    pub fatigue_level: f64,
    pub heart_rate_variability: f64,
}

impl Default for PrimaryMetrics {
    /// Starting values offered for a newly registered athlete
    fn default() -> Self {
        PrimaryMetrics {
            training_load: 75.0,
            sleep_quality: 75.0,
            fatigue_level: 25.0,
            heart_rate_variability: 65.0,
        }
    }
}

impl PrimaryMetrics {
    /// Build a metric set, clamping every field into its domain
    pub fn new(
        training_load: f64,
        sleep_quality: f64,
        fatigue_level: f64,
        heart_rate_variability: f64,
    ) -> Self {
        PrimaryMetrics {
            training_load,
            sleep_quality,
            fatigue_level,
            heart_rate_variability,
        }
        .clamped()
    }

    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::TrainingLoad => self.training_load,
            MetricField::SleepQuality => self.sleep_quality,
            MetricField::FatigueLevel => self.fatigue_level,
            MetricField::HeartRateVariability => self.heart_rate_variability,
        }
    }

    /// Copy of these metrics with one field replaced by its clamped value
    pub fn with(&self, field: MetricField, value: f64) -> Self {
        let value = field.range().clamp(value);
        let mut next = *self;
        match field {
            MetricField::TrainingLoad => next.training_load = value,
            MetricField::SleepQuality => next.sleep_quality = value,
            MetricField::FatigueLevel => next.fatigue_level = value,
            MetricField::HeartRateVariability => next.heart_rate_variability = value,
        }
        next
    }

    pub fn clamped(&self) -> Self {
        MetricField::ALL
            .iter()
            .fold(*self, |acc, field| acc.with(*field, acc.get(*field)))
    }

    /// Round every field to a whole number
    pub fn rounded(&self) -> Self {
        PrimaryMetrics {
            training_load: self.training_load.round(),
            sleep_quality: self.sleep_quality.round(),
            fatigue_level: self.fatigue_level.round(),
            heart_rate_variability: self.heart_rate_variability.round(),
        }
    }

    pub fn is_within_domain(&self) -> bool {
        MetricField::ALL
            .iter()
            .all(|field| field.range().contains(self.get(*field)))
    }
}

/// Full metric record: the primary inputs plus the two scores derived from them.
///
/// Only constructed through [`HealthMetrics::from_primary`], so the derived scores can
/// never drift from the inputs they were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    #[serde(flatten)]
    primary: PrimaryMetrics,
    #[serde(serialize_with = "serialize_rounded_risk")]
    injury_risk: f64,
    health_score: u8,
}

/// Records show injury risk as a whole number; the score is derived from the exact value
fn serialize_rounded_risk<S: Serializer>(injury_risk: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(round_risk(*injury_risk))
}

fn round_risk(injury_risk: f64) -> u8 {
    INJURY_RISK_RANGE.clamp(injury_risk.round()) as u8
}

impl HealthMetrics {
    /// Clamp the inputs and derive injury risk and health score from them
    pub fn from_primary(primary: PrimaryMetrics) -> Self {
        let primary = primary.clamped();
        let injury_risk = RiskCalculator::injury_risk(&primary);
        let health_score = ScoreDeriver::health_score(injury_risk);

        HealthMetrics {
            primary,
            injury_risk,
            health_score,
        }
    }

    pub fn primary(&self) -> &PrimaryMetrics {
        &self.primary
    }

    pub fn injury_risk(&self) -> f64 {
        self.injury_risk
    }

    /// Injury risk rounded half away from zero, as displayed and serialized
    pub fn rounded_injury_risk(&self) -> u8 {
        round_risk(self.injury_risk)
    }

    pub fn health_score(&self) -> u8 {
        self.health_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_parsing() {
        assert_eq!(
            "trainingLoad".parse::<MetricField>().unwrap(),
            MetricField::TrainingLoad
        );
        assert_eq!(
            "recentTrainingLoad".parse::<MetricField>().unwrap(),
            MetricField::TrainingLoad
        );
        assert_eq!(
            "sleep_quality".parse::<MetricField>().unwrap(),
            MetricField::SleepQuality
        );
        assert_eq!(
            "fatigue-level".parse::<MetricField>().unwrap(),
            MetricField::FatigueLevel
        );
        assert_eq!(
            "HRV".parse::<MetricField>().unwrap(),
            MetricField::HeartRateVariability
        );

        let err = "stamina".parse::<MetricField>().unwrap_err();
        assert!(matches!(err, HealthError::InvalidField { field } if field == "stamina"));
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in MetricField::ALL {
            assert_eq!(field.name().parse::<MetricField>().unwrap(), field);
        }
    }

    #[test]
    fn test_clamping() {
        let metrics = PrimaryMetrics::new(120.0, 10.0, 0.0, 200.0);
        assert_eq!(metrics.training_load, 100.0);
        assert_eq!(metrics.sleep_quality, 40.0);
        assert_eq!(metrics.fatigue_level, 10.0);
        assert_eq!(metrics.heart_rate_variability, 100.0);
        assert!(metrics.is_within_domain());
    }

    #[test]
    fn test_nan_clamps_to_lower_bound() {
        let metrics = PrimaryMetrics::default().with(MetricField::SleepQuality, f64::NAN);
        assert_eq!(metrics.sleep_quality, 40.0);
    }

    #[test]
    fn test_with_leaves_other_fields() {
        let base = PrimaryMetrics::default();
        let edited = base.with(MetricField::FatigueLevel, 80.0);

        assert_eq!(edited.fatigue_level, 80.0);
        assert_eq!(edited.training_load, base.training_load);
        assert_eq!(edited.sleep_quality, base.sleep_quality);
        assert_eq!(edited.heart_rate_variability, base.heart_rate_variability);
    }

    #[test]
    fn test_health_metrics_derived_together() {
        let metrics = HealthMetrics::from_primary(PrimaryMetrics::default());

        // 22.5 + 6.25 + 7.5 + 5.25 = 41.5 -> 100 - 24.9 = 75.1
        assert!((metrics.injury_risk() - 41.5).abs() < 1e-9);
        assert_eq!(metrics.health_score(), 75);
    }

    #[test]
    fn test_health_metrics_serialize_flat() {
        let metrics = HealthMetrics::from_primary(PrimaryMetrics::default());
        let json = serde_json::to_value(metrics).unwrap();

        assert_eq!(json["trainingLoad"], 75.0);
        assert_eq!(json["injuryRisk"], 42);
        assert_eq!(json["healthScore"], 75);
        assert!(json.get("primary").is_none());
    }

    #[test]
    fn test_injury_risk_rounds_for_display_only() {
        let metrics = HealthMetrics::from_primary(PrimaryMetrics::new(92.0, 58.0, 72.0, 48.0));

        // 67.5 rounds up; the health score still comes from the exact value
        assert!((metrics.injury_risk() - 67.5).abs() < 1e-9);
        assert_eq!(metrics.rounded_injury_risk(), 68);
        assert_eq!(metrics.health_score(), 60);
        assert_eq!(serde_json::to_value(metrics).unwrap()["injuryRisk"], 68);
    }
}
