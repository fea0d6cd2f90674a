//! Athlete records
//!
//! An [`Athlete`] is an immutable value. The engine never edits one in place: every update
//! builds a replacement record and swaps it into the store, so anyone holding an earlier
//! `Arc<Athlete>` keeps a consistent snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::history::HealthHistory;
use crate::metrics::{HealthMetrics, PrimaryMetrics};
use crate::status::AthleteStatus;

/// Engine-assigned athlete identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AthleteId(pub u64);

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Athlete with current metrics, status and score history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
    pub team: String,
    pub position: String,
    pub status: AthleteStatus,
    pub metrics: HealthMetrics,
    pub history: HealthHistory,
}

impl Athlete {
    pub fn health_score(&self) -> u8 {
        self.metrics.health_score()
    }

    pub fn injury_risk(&self) -> f64 {
        self.metrics.injury_risk()
    }
}

/// Registration request for a new athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAthlete {
    pub name: String,
    pub team: String,
    pub position: String,
    /// Initial status, kept until the first recomputation
    pub status: AthleteStatus,
    pub metrics: PrimaryMetrics,
}

impl NewAthlete {
    /// Active athlete with the default starting metrics
    pub fn new(
        name: impl Into<String>,
        team: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        NewAthlete {
            name: name.into(),
            team: team.into(),
            position: position.into(),
            status: AthleteStatus::Active,
            metrics: PrimaryMetrics::default(),
        }
    }

    pub fn with_status(mut self, status: AthleteStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_metrics(mut self, metrics: PrimaryMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}
