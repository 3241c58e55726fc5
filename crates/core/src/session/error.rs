//! Error types for stage navigation.

use ap_protocol::stage_models::StageId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Forward navigation must start from the active stage.
    #[error("Cannot advance from stage {from}: the active stage is {current}")]
    CannotAdvance { from: StageId, current: StageId },

    /// The last stage has no successor.
    #[error("Cannot advance past the last stage {0}")]
    AtLastStage(StageId),

    /// Stages ahead of the active one cannot be entered.
    #[error("Stage {stage} is not reached yet: the active stage is {current}")]
    StageNotReached { stage: StageId, current: StageId },

    /// Backward navigation must target an earlier stage.
    #[error("Cannot retreat to stage {to}: the active stage is {current}")]
    CannotRetreat { to: StageId, current: StageId },

    /// A stage needs a result that an upstream stage has not written yet.
    #[error("Stage {stage} requires the result of stage {requires}")]
    MissingUpstream { stage: StageId, requires: StageId },
}

/// Type alias for Result with SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
