//! Time sources for playback.
//!
//! The scheduler never sleeps directly; it asks a [`Clock`]. Production uses
//! [`TokioClock`], tests and fast-forward runs use [`LogicalClock`], which
//! advances virtual time instantly.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend the caller for `duration` of this clock's time.
    async fn sleep(&self, duration: Duration);

    /// Time elapsed since the clock was created.
    fn elapsed(&self) -> Duration;
}

/// Wall-clock time backed by `tokio::time`.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual time that advances by exactly the requested amount on each sleep.
///
/// Sleeping still yields to the runtime once, so other tasks (a canceller,
/// a UI subscriber) get a chance to run between events.
#[derive(Debug, Default)]
pub struct LogicalClock {
    now_ms: AtomicU64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward without sleeping.
    pub fn advance(&self, duration: Duration) {
        self.now_ms
            .fetch_add(duration_ms(duration), Ordering::SeqCst);
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Clock for LogicalClock {
    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }
}
