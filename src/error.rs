//! Unified error hierarchy for squadhealth
//!
//! The engine has exactly one hard failure (an unknown athlete). Everything else on the
//! engine path is clamped. Configuration failures only surface from the configuration
//! layer; file I/O is reported through `anyhow` context there.

use thiserror::Error;

use crate::athlete::AthleteId;

/// Top-level error type for all squadhealth operations
#[derive(Debug, Error)]
pub enum HealthError {
    /// No athlete with this id is held by the engine
    #[error("Athlete not found: {athlete_id}")]
    NotFound { athlete_id: AthleteId },

    /// A metric edit named a field that is not one of the four primary metrics
    #[error("Invalid metric field: {field}")]
    InvalidField { field: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for squadhealth operations
pub type Result<T> = std::result::Result<T, HealthError>;

impl HealthError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HealthError::NotFound { .. } => ErrorSeverity::Warning,
            HealthError::InvalidField { .. } => ErrorSeverity::Warning,
            HealthError::Configuration(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            HealthError::NotFound { athlete_id } => {
                format!("No athlete with id {} is on the roster.", athlete_id)
            }
            HealthError::InvalidField { field } => {
                format!(
                    "'{}' is not an editable metric. Use trainingLoad, sleepQuality, fatigueLevel or heartRateVariability.",
                    field
                )
            }
            HealthError::Configuration(reason) => {
                format!(
                    "Invalid configuration: {}. Fix the file or write a fresh one with `squadhealth config --init`.",
                    reason
                )
            }
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = HealthError::NotFound {
            athlete_id: AthleteId(42),
        };
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = HealthError::Configuration("bad".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(err.user_message().contains("config --init"));
    }

    #[test]
    fn test_user_messages() {
        let err = HealthError::NotFound {
            athlete_id: AthleteId(7),
        };
        assert!(err.user_message().contains("No athlete with id 7"));

        let err = HealthError::InvalidField {
            field: "stamina".to_string(),
        };
        assert!(err.user_message().contains("'stamina'"));
        assert_eq!(err.to_string(), "Invalid metric field: stamina");
    }
}
