// Library interface for squadhealth modules
// The binary and integration tests drive the engine through these re-exports

pub mod athlete;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod risk;
pub mod roster;
pub mod scheduler;
pub mod score;
pub mod simulator;
pub mod status;

// Re-export commonly used types for convenience
pub use athlete::{Athlete, AthleteId, NewAthlete};
pub use config::AppConfig;
pub use engine::{assess, Assessment, EngineConfig, HealthEngine, SensitivityUpdate, SquadSummary};
pub use error::{HealthError, Result};
pub use history::{HealthHistory, HistoryEntry, HistoryTrend};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{HealthMetrics, MetricField, PrimaryMetrics};
pub use risk::RiskCalculator;
pub use scheduler::{SchedulerHandle, TickReport, TickScheduler};
pub use score::ScoreDeriver;
pub use simulator::{MetricSimulator, SimulationConfig};
pub use status::{AthleteStatus, StatusClassifier};
