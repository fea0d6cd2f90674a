//! Demo roster used by the command-line front end

use crate::athlete::NewAthlete;
use crate::metrics::PrimaryMetrics;
use crate::status::AthleteStatus;

/// Three athletes across three teams, one of them starting as injured
pub fn demo_roster() -> Vec<NewAthlete> {
    vec![
        NewAthlete::new("John Smith", "Lions FC", "Forward")
            .with_metrics(PrimaryMetrics::new(85.0, 76.0, 25.0, 62.0)),
        NewAthlete::new("Sarah Johnson", "Eagles Basketball", "Point Guard")
            .with_status(AthleteStatus::Injured)
            .with_metrics(PrimaryMetrics::new(92.0, 58.0, 72.0, 48.0)),
        NewAthlete::new("Mike Brown", "Sharks Swimming", "Freestyle")
            .with_metrics(PrimaryMetrics::new(78.0, 84.0, 30.0, 75.0)),
    ]
}
