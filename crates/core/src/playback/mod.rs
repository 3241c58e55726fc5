//! Timeline playback.
//!
//! This module provides:
//! - [`clock`]: injectable time sources (wall clock and logical clock)
//! - [`scheduler`]: the start-once, cancellable playback loop
//! - [`board`]: the subscribable entity state a renderer observes

pub mod board;
pub mod clock;
pub mod scheduler;

pub use board::PlaybackBoard;
pub use clock::{Clock, LogicalClock, TokioClock};
pub use scheduler::{PlaybackOutcome, PlaybackPhase, PlaybackScheduler};
