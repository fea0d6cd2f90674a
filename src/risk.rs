//! Injury risk calculation
//!
//! # Model
//!
//! Injury risk is a fixed-weight linear blend of the four primary metrics. Higher training
//! load and fatigue raise risk directly; sleep quality and heart rate variability raise risk
//! through their deficit from 100:
//!
//! ```text
//! risk = 0.30 * load + 0.25 * (100 - sleep) + 0.30 * fatigue + 0.15 * (100 - hrv)
//! ```
//!
//! The result is clamped to 5-100. Inside the metric domain the blend already spans
//! 18-84, so the clamp only guards callers that skip input clamping.

use serde::Serialize;

use crate::metrics::{PrimaryMetrics, INJURY_RISK_RANGE};

pub const TRAINING_LOAD_WEIGHT: f64 = 0.30;
pub const SLEEP_DEFICIT_WEIGHT: f64 = 0.25;
pub const FATIGUE_WEIGHT: f64 = 0.30;
pub const HRV_DEFICIT_WEIGHT: f64 = 0.15;

/// Per-factor share of an injury risk score, before clamping
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskBreakdown {
    pub training_load: f64,
    pub sleep_deficit: f64,
    pub fatigue: f64,
    pub hrv_deficit: f64,
}

impl RiskBreakdown {
    pub fn total(&self) -> f64 {
        self.training_load + self.sleep_deficit + self.fatigue + self.hrv_deficit
    }

    /// Name of the factor contributing the most risk
    pub fn dominant_factor(&self) -> &'static str {
        [
            ("training load", self.training_load),
            ("sleep deficit", self.sleep_deficit),
            ("fatigue", self.fatigue),
            ("HRV deficit", self.hrv_deficit),
        ]
        .into_iter()
        .fold(("training load", f64::MIN), |best, next| {
            if next.1 > best.1 {
                next
            } else {
                best
            }
        })
        .0
    }
}

/// Stateless injury risk calculator
pub struct RiskCalculator;

impl RiskCalculator {
    /// Injury risk in [5, 100] for already-clamped metrics
    pub fn injury_risk(metrics: &PrimaryMetrics) -> f64 {
        INJURY_RISK_RANGE.clamp(Self::breakdown(metrics).total())
    }

    pub fn breakdown(metrics: &PrimaryMetrics) -> RiskBreakdown {
        RiskBreakdown {
            training_load: metrics.training_load * TRAINING_LOAD_WEIGHT,
            sleep_deficit: (100.0 - metrics.sleep_quality) * SLEEP_DEFICIT_WEIGHT,
            fatigue: metrics.fatigue_level * FATIGUE_WEIGHT,
            hrv_deficit: (100.0 - metrics.heart_rate_variability) * HRV_DEFICIT_WEIGHT,
        }
    }
}
