//! Error types for fixture lookup and validation.

use thiserror::Error;

/// A fixture is missing or cannot drive a safe playback.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// No fixture is registered under the requested id.
    #[error("No fixture for dataset '{dataset_id}'")]
    NotFound { dataset_id: String },

    /// The dataset has no objective with the requested id.
    #[error("Dataset '{dataset_id}' has no objective '{objective_id}'")]
    UnknownObjective {
        dataset_id: String,
        objective_id: String,
    },

    /// An entity has a zero or negative duration budget.
    #[error("Fixture '{dataset_id}': entity {entity} has non-positive duration {duration_ms}ms")]
    NonPositiveDuration {
        dataset_id: String,
        entity: String,
        duration_ms: i64,
    },

    /// A timeline section has no entities.
    #[error("Fixture '{dataset_id}': {section} has no entities")]
    EmptyEntities {
        dataset_id: String,
        section: &'static str,
    },

    /// Drift synthesis needs at least one feature name.
    #[error("Fixture '{dataset_id}': drift has no monitored features")]
    MissingFeatures { dataset_id: String },

    /// An embedded fixture file could not be parsed.
    #[error("Failed to parse built-in fixture {file}: {source}")]
    Parse {
        file: String,
        source: serde_yaml::Error,
    },
}

/// Type alias for Result with FixtureError.
pub type FixtureResult<T> = Result<T, FixtureError>;
