//! Error types for timeline construction.

use thiserror::Error;

/// Errors that make a timeline unsafe to play.
///
/// No partial timeline is ever returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// The step granularity was zero.
    #[error("Timeline step must be positive")]
    InvalidStep,

    /// No entities were supplied.
    #[error("Timeline has no entities")]
    EmptyEntities,

    /// An entity was declared twice.
    #[error("Entity {0} is declared more than once")]
    DuplicateEntity(String),

    /// An entity has a zero or negative duration budget.
    #[error("Entity {entity} has non-positive duration {duration_ms}ms")]
    NonPositiveDuration { entity: String, duration_ms: i64 },
}

/// Type alias for Result with TimelineError.
pub type TimelineResult<T> = Result<T, TimelineError>;
