//! Cooperative playback of a timeline.
//!
//! A [`PlaybackScheduler`] delivers each event of a timeline at its offset,
//! measured on an injected [`Clock`]. Lifecycle:
//!
//! ```text
//! Idle -> Playing -> Finished
//!   \        \
//!    `--------`-> Cancelled
//! ```
//!
//! `start` is latched: only the first call on an `Idle` scheduler plays.
//! Any later call (a UI re-mount, a duplicate click) is ignored and reports
//! why through [`PlaybackOutcome::Ignored`].

use ap_protocol::timeline_models::TimelineEvent;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, trace};

use super::clock::Clock;

/// Default ceiling for one inter-event wait.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(100);

/// Lifecycle phase of one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackPhase {
    Idle = 0,
    Playing = 1,
    Finished = 2,
    Cancelled = 3,
}

impl PlaybackPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PlaybackPhase::Idle,
            1 => PlaybackPhase::Playing,
            2 => PlaybackPhase::Finished,
            _ => PlaybackPhase::Cancelled,
        }
    }
}

/// How a call to [`PlaybackScheduler::start`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every event was delivered and `on_finished` ran.
    Finished { delivered: usize },

    /// Playback stopped early; `on_finished` did not run.
    Cancelled { delivered: usize },

    /// The scheduler was not idle, so nothing was played.
    Ignored(PlaybackPhase),
}

struct Shared {
    phase: AtomicU8,
    wake: Notify,
}

impl Shared {
    fn phase(&self) -> PlaybackPhase {
        PlaybackPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    fn transition(&self, from: PlaybackPhase, to: PlaybackPhase) -> bool {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn is_cancelled(&self) -> bool {
        self.phase() == PlaybackPhase::Cancelled
    }
}

/// Plays one timeline once.
///
/// Cloning yields another handle to the same playback, which is how a
/// caller cancels a run that another task is awaiting.
#[derive(Clone)]
pub struct PlaybackScheduler {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    max_wait: Duration,
    tail: Duration,
}

impl PlaybackScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                phase: AtomicU8::new(PlaybackPhase::Idle as u8),
                wake: Notify::new(),
            }),
            clock,
            max_wait: DEFAULT_MAX_WAIT,
            tail: Duration::ZERO,
        }
    }

    /// Cap every inter-event wait at `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Hold for `tail` after the last event before finishing.
    ///
    /// The tail is not capped by `max_wait` and can be cancelled like any
    /// other wait; a cancel during the tail suppresses `on_finished`.
    pub fn with_tail(mut self, tail: Duration) -> Self {
        self.tail = tail;
        self
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.shared.phase()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }

    /// Stop playback.
    ///
    /// Valid from `Idle` (the next `start` becomes a no-op) and from
    /// `Playing` (no further events are delivered, `on_finished` never
    /// runs). Returns `false` when the scheduler had already finished or
    /// was already cancelled.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .shared
            .transition(PlaybackPhase::Idle, PlaybackPhase::Cancelled)
            || self
                .shared
                .transition(PlaybackPhase::Playing, PlaybackPhase::Cancelled);
        if cancelled {
            debug!("playback cancelled");
            self.shared.wake.notify_waiters();
        }
        cancelled
    }

    /// Play `events` in order, calling `on_event` for each at its offset and
    /// `on_finished` once after the last.
    ///
    /// Before each event the loop waits `offset - previous_offset`, capped at
    /// the configured maximum. Cancellation is checked before each wait and
    /// again before each dispatch. A cancel arriving during a wait ends the
    /// wait early.
    pub async fn start<E, F>(&self, events: &[TimelineEvent], mut on_event: E, on_finished: F) -> PlaybackOutcome
    where
        E: FnMut(&TimelineEvent),
        F: FnOnce(),
    {
        if !self
            .shared
            .transition(PlaybackPhase::Idle, PlaybackPhase::Playing)
        {
            let phase = self.phase();
            debug!(?phase, "ignoring duplicate playback start");
            return PlaybackOutcome::Ignored(phase);
        }

        debug!(events = events.len(), "playback started");
        let mut previous_ms = 0;
        let mut delivered = 0;

        for event in events {
            if self.is_cancelled() {
                return PlaybackOutcome::Cancelled { delivered };
            }

            let gap = event.offset_ms.saturating_sub(previous_ms);
            if gap > 0 {
                self.wait(Duration::from_millis(gap).min(self.max_wait)).await;
            }
            previous_ms = event.offset_ms;

            if self.is_cancelled() {
                return PlaybackOutcome::Cancelled { delivered };
            }

            trace!(entity = %event.entity, progress = event.progress, "dispatch");
            on_event(event);
            delivered += 1;
        }

        if !self.tail.is_zero() {
            self.wait(self.tail).await;
        }

        // A cancel racing the last event wins: on_finished must not run.
        if !self
            .shared
            .transition(PlaybackPhase::Playing, PlaybackPhase::Finished)
        {
            return PlaybackOutcome::Cancelled { delivered };
        }

        debug!(delivered, "playback finished");
        on_finished();
        PlaybackOutcome::Finished { delivered }
    }

    /// Sleep on the clock for `duration`, returning early on cancellation.
    ///
    /// Shares the cancellation flag with event playback, so stages can use it
    /// for pauses outside the timeline (the champion reveal).
    pub async fn wait(&self, duration: Duration) {
        let notified = self.shared.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }

        tokio::select! {
            _ = self.clock.sleep(duration) => {}
            _ = &mut notified => {}
        }
    }
}
