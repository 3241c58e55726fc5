//! Pipeline session state and its event-emitting transitions.

pub mod error;
pub mod pipeline;
pub mod transitions;

pub use error::{SessionError, SessionResult};
pub use pipeline::{PipelineSession, WriteOutcome};
