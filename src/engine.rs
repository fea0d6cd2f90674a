//! Health engine - owns the roster and runs the scoring pipeline
//!
//! Both update paths end in the same pipeline:
//!
//! ```text
//! candidate metrics -> clamp -> injury risk -> health score -> status -> history -> commit
//! ```
//!
//! - **Simulated tick** ([`HealthEngine::run_tick`]): the simulator picks and perturbs
//!   athletes; every picked athlete is recomputed.
//! - **Manual edit** ([`HealthEngine::set_metric`]): one primary metric is replaced and the
//!   athlete is recomputed.
//!
//! The pipeline builds a complete replacement [`Athlete`] before anything is stored, so a
//! reader never sees a half-applied update.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use squadhealth::athlete::NewAthlete;
//! use squadhealth::engine::{EngineConfig, HealthEngine};
//!
//! let mut engine = HealthEngine::seeded(EngineConfig::default(), 42);
//! let today = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
//!
//! let athlete = engine.create_athlete_on(NewAthlete::new("Ada Park", "Lions FC", "Forward"), today);
//! let updated = engine.set_metric_on(athlete.id, "fatigueLevel", 95.0, today).unwrap();
//!
//! assert!(updated.health_score() < athlete.health_score());
//! assert_eq!(updated.history.len(), 2);
//! ```

use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::athlete::{Athlete, AthleteId, NewAthlete};
use crate::error::{HealthError, Result};
use crate::history::{HealthHistory, HistoryEntry};
use crate::metrics::{HealthMetrics, MetricField, PrimaryMetrics};
use crate::simulator::MetricSimulator;
use crate::status::{clamp_sensitivity, AthleteStatus, StatusClassifier, DEFAULT_SENSITIVITY};

/// Runtime switches of the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// When false, ticks still fire but do nothing
    pub simulation_enabled: bool,

    /// Classification sensitivity, 0-100
    pub sensitivity: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            simulation_enabled: true,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl EngineConfig {
    pub fn new(simulation_enabled: bool, sensitivity: f64) -> Self {
        EngineConfig {
            simulation_enabled,
            sensitivity: clamp_sensitivity(sensitivity),
        }
    }
}

/// Scores and status derived from one set of primary metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub metrics: HealthMetrics,
    pub status: AthleteStatus,
}

/// Run the pure part of the pipeline: clamp, score and classify
pub fn assess(primary: PrimaryMetrics, sensitivity: f64) -> Assessment {
    let metrics = HealthMetrics::from_primary(primary);
    let status = StatusClassifier::classify(metrics.health_score(), sensitivity);
    Assessment { metrics, status }
}

/// Outcome of a sensitivity change
#[derive(Debug, Clone)]
pub struct SensitivityUpdate {
    pub config: EngineConfig,
    /// Athletes whose status changed under the new sensitivity
    pub reclassified: Vec<Arc<Athlete>>,
}

/// Roster counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SquadSummary {
    pub total: usize,
    pub active: usize,
    pub at_risk: usize,
    pub injured: usize,
    pub reserve: usize,
}

/// Owner of all athlete records and the engine configuration
pub struct HealthEngine<R = StdRng> {
    config: EngineConfig,
    simulator: MetricSimulator,
    athletes: BTreeMap<AthleteId, Arc<Athlete>>,
    next_id: u64,
    rng: R,
}

impl HealthEngine<StdRng> {
    /// Engine whose simulator is seeded from OS entropy
    pub fn from_entropy(config: EngineConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Engine whose simulator replays the same drift for the same seed
    pub fn seeded(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> HealthEngine<R> {
    pub fn new(config: EngineConfig, simulator: MetricSimulator, rng: R) -> Self {
        HealthEngine {
            config: EngineConfig::new(config.simulation_enabled, config.sensitivity),
            simulator,
            athletes: BTreeMap::new(),
            next_id: 1,
            rng,
        }
    }

    pub fn with_rng(config: EngineConfig, rng: R) -> Self {
        Self::new(config, MetricSimulator::new(), rng)
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn simulator(&self) -> &MetricSimulator {
        &self.simulator
    }

    pub fn len(&self) -> usize {
        self.athletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.athletes.is_empty()
    }

    /// Register an athlete dated today
    pub fn create_athlete(&mut self, new: NewAthlete) -> Arc<Athlete> {
        self.create_athlete_on(new, today())
    }

    /// Register an athlete, scoring the initial metrics and seeding history with one entry.
    ///
    /// The caller-supplied status is kept as-is until the first recomputation.
    pub fn create_athlete_on(&mut self, new: NewAthlete, date: NaiveDate) -> Arc<Athlete> {
        let id = AthleteId(self.next_id);
        self.next_id += 1;

        let metrics = HealthMetrics::from_primary(new.metrics);
        let athlete = Athlete {
            id,
            name: new.name,
            team: new.team,
            position: new.position,
            status: new.status,
            metrics,
            history: HealthHistory::seeded(HistoryEntry::new(date, metrics.health_score())),
        };

        info!(
            athlete_id = %id,
            name = %athlete.name,
            health_score = metrics.health_score(),
            status = %athlete.status,
            "Athlete registered"
        );

        self.commit(athlete)
    }

    pub fn get_athlete(&self, id: AthleteId) -> Result<Arc<Athlete>> {
        self.athletes.get(&id).cloned().ok_or_else(|| {
            warn!(athlete_id = %id, "Unknown athlete");
            HealthError::NotFound { athlete_id: id }
        })
    }

    /// Snapshot of every athlete in id order
    pub fn athletes(&self) -> Vec<Arc<Athlete>> {
        self.athletes.values().cloned().collect()
    }

    /// Manual edit dated today; `field` is parsed as a [`MetricField`]
    pub fn set_metric(&mut self, id: AthleteId, field: &str, value: f64) -> Result<Arc<Athlete>> {
        self.set_metric_on(id, field, value, today())
    }

    pub fn set_metric_on(
        &mut self,
        id: AthleteId,
        field: &str,
        value: f64,
        date: NaiveDate,
    ) -> Result<Arc<Athlete>> {
        let current = self.get_athlete(id)?;
        let field = field.parse::<MetricField>().map_err(|e| {
            warn!(athlete_id = %id, field, "Rejected edit of unknown metric");
            e
        })?;
        Ok(self.apply_edit(&current, field, value, date))
    }

    pub fn set_metric_field(
        &mut self,
        id: AthleteId,
        field: MetricField,
        value: f64,
    ) -> Result<Arc<Athlete>> {
        self.set_metric_field_on(id, field, value, today())
    }

    pub fn set_metric_field_on(
        &mut self,
        id: AthleteId,
        field: MetricField,
        value: f64,
        date: NaiveDate,
    ) -> Result<Arc<Athlete>> {
        let current = self.get_athlete(id)?;
        Ok(self.apply_edit(&current, field, value, date))
    }

    /// Advance the simulation by one scheduling period.
    ///
    /// Returns the athletes that were recomputed, in id order. With simulation disabled
    /// this is a no-op returning an empty list.
    pub fn run_tick(&mut self, now: NaiveDate) -> Vec<Arc<Athlete>> {
        if !self.config.simulation_enabled {
            trace!(%now, "Simulation disabled, tick skipped");
            return Vec::new();
        }

        let roster: Vec<Arc<Athlete>> = self.athletes.values().cloned().collect();
        let mut changed = Vec::new();

        for athlete in roster {
            match self
                .simulator
                .simulate(athlete.metrics.primary(), &mut self.rng)
            {
                Some(primary) => changed.push(self.recompute(&athlete, primary, now)),
                None => trace!(athlete_id = %athlete.id, "Athlete not selected this tick"),
            }
        }

        debug!(%now, roster = self.athletes.len(), changed = changed.len(), "Tick applied");
        changed
    }

    pub fn set_simulation_enabled(&mut self, enabled: bool) -> EngineConfig {
        if self.config.simulation_enabled != enabled {
            info!(enabled, "Simulation toggled");
        }
        self.config.simulation_enabled = enabled;
        self.config
    }

    /// Change sensitivity (clamped to 0-100) and reclassify every athlete whose status
    /// no longer matches. Health scores and histories are left untouched.
    pub fn set_sensitivity(&mut self, sensitivity: f64) -> SensitivityUpdate {
        let clamped = clamp_sensitivity(sensitivity);
        if clamped != sensitivity {
            debug!(requested = sensitivity, applied = clamped, "Sensitivity clamped");
        }
        self.config.sensitivity = clamped;

        let stale: Vec<(Arc<Athlete>, AthleteStatus)> = self
            .athletes
            .values()
            .filter_map(|athlete| {
                let status = StatusClassifier::classify(athlete.health_score(), clamped);
                (status != athlete.status).then(|| (Arc::clone(athlete), status))
            })
            .collect();

        let reclassified = stale
            .into_iter()
            .map(|(athlete, status)| {
                info!(
                    athlete_id = %athlete.id,
                    from = %athlete.status,
                    to = %status,
                    "Athlete reclassified"
                );
                self.commit(Athlete {
                    status,
                    ..(*athlete).clone()
                })
            })
            .collect();

        info!(sensitivity = clamped, "Sensitivity updated");
        SensitivityUpdate {
            config: self.config,
            reclassified,
        }
    }

    /// Dashboard counts by status
    pub fn summary(&self) -> SquadSummary {
        self.athletes
            .values()
            .fold(SquadSummary::default(), |mut summary, athlete| {
                summary.total += 1;
                match athlete.status {
                    AthleteStatus::Active => summary.active += 1,
                    AthleteStatus::AtRisk => summary.at_risk += 1,
                    AthleteStatus::Injured => summary.injured += 1,
                    AthleteStatus::Reserve => summary.reserve += 1,
                }
                summary
            })
    }

    fn apply_edit(
        &mut self,
        current: &Athlete,
        field: MetricField,
        value: f64,
        date: NaiveDate,
    ) -> Arc<Athlete> {
        let primary = current.metrics.primary().with(field, value);
        if primary.get(field) != value {
            debug!(
                athlete_id = %current.id,
                %field,
                requested = value,
                applied = primary.get(field),
                "Metric clamped"
            );
        }
        self.recompute(current, primary, date)
    }

    fn recompute(&mut self, current: &Athlete, primary: PrimaryMetrics, date: NaiveDate) -> Arc<Athlete> {
        let assessment = assess(primary, self.config.sensitivity);
        let health_score = assessment.metrics.health_score();
        let history = current
            .history
            .append(HistoryEntry::new(date, health_score));
        if let Some(recorded) = history.latest().map(|entry| entry.date).filter(|d| *d != date) {
            debug!(
                athlete_id = %current.id,
                requested = %date,
                %recorded,
                "Backdated history entry moved to latest date"
            );
        }

        if assessment.status != current.status {
            info!(
                athlete_id = %current.id,
                from = %current.status,
                to = %assessment.status,
                health_score,
                "Athlete status changed"
            );
        }
        debug!(
            athlete_id = %current.id,
            injury_risk = assessment.metrics.injury_risk(),
            health_score,
            "Athlete recomputed"
        );

        self.commit(Athlete {
            status: assessment.status,
            metrics: assessment.metrics,
            history,
            ..current.clone()
        })
    }

    fn commit(&mut self, athlete: Athlete) -> Arc<Athlete> {
        let athlete = Arc::new(athlete);
        self.athletes.insert(athlete.id, Arc::clone(&athlete));
        athlete
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
