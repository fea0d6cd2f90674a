//! Athlete status classification
//!
//! # Thresholds
//!
//! Sensitivity (0-100) is converted to a threshold of `100 - sensitivity`:
//!
//! - health score below `threshold - 15`: **Injured**
//! - health score below `threshold`: **At Risk**
//! - otherwise: **Active**
//!
//! Comparisons are strict, so a score sitting exactly on a boundary falls to the less
//! severe status. Lowering sensitivity raises the threshold and widens both unhealthy
//! bands at once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensitivity used when none is configured
pub const DEFAULT_SENSITIVITY: f64 = 70.0;

/// Distance below the threshold at which an athlete is classified as injured
pub const INJURED_MARGIN: f64 = 15.0;

/// Availability status of an athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AthleteStatus {
    /// Fit to train and compete
    Active,
    /// Health score below threshold, monitor closely
    #[serde(rename = "At Risk")]
    AtRisk,
    /// Health score well below threshold
    Injured,
    /// Assigned by hand at registration; never produced by the classifier
    Reserve,
}

impl fmt::Display for AthleteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AthleteStatus::Active => write!(f, "Active"),
            AthleteStatus::AtRisk => write!(f, "At Risk"),
            AthleteStatus::Injured => write!(f, "Injured"),
            AthleteStatus::Reserve => write!(f, "Reserve"),
        }
    }
}

impl std::str::FromStr for AthleteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "active" => Ok(AthleteStatus::Active),
            "at risk" | "atrisk" => Ok(AthleteStatus::AtRisk),
            "injured" => Ok(AthleteStatus::Injured),
            "reserve" => Ok(AthleteStatus::Reserve),
            _ => Err(format!("Invalid athlete status: {}", s)),
        }
    }
}

impl AthleteStatus {
    /// True for statuses that should raise a flag on a squad overview
    pub fn is_flagged(&self) -> bool {
        matches!(self, AthleteStatus::AtRisk | AthleteStatus::Injured)
    }

    /// Get status description
    pub fn description(&self) -> &'static str {
        match self {
            AthleteStatus::Active => "Healthy and available",
            AthleteStatus::AtRisk => "Elevated injury risk",
            AthleteStatus::Injured => "Likely injured or close to it",
            AthleteStatus::Reserve => "Held in reserve",
        }
    }

    /// Get coaching recommendation
    pub fn recommendation(&self) -> &'static str {
        match self {
            AthleteStatus::Active => "Continue the planned training load",
            AthleteStatus::AtRisk => "Reduce intensity and prioritise sleep and recovery",
            AthleteStatus::Injured => "Withdraw from training and refer to medical staff",
            AthleteStatus::Reserve => "Maintain conditioning and monitor readiness",
        }
    }
}

/// Clamp a sensitivity into 0-100. NaN falls back to the default.
pub fn clamp_sensitivity(sensitivity: f64) -> f64 {
    if sensitivity.is_nan() {
        return DEFAULT_SENSITIVITY;
    }
    sensitivity.clamp(0.0, 100.0)
}

/// Stateless status classifier
pub struct StatusClassifier;

impl StatusClassifier {
    /// Health score below which an athlete stops being active
    pub fn threshold(sensitivity: f64) -> f64 {
        100.0 - clamp_sensitivity(sensitivity)
    }

    /// Classify a health score. Never returns [`AthleteStatus::Reserve`].
    pub fn classify(health_score: u8, sensitivity: f64) -> AthleteStatus {
        let threshold = Self::threshold(sensitivity);
        let score = f64::from(health_score);

        if score < threshold - INJURED_MARGIN {
            AthleteStatus::Injured
        } else if score < threshold {
            AthleteStatus::AtRisk
        } else {
            AthleteStatus::Active
        }
    }
}
