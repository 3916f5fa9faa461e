//! Request pacing between downloads and between batches.
//!
//! The [`Pacer`] is a fixed-interval gate: every wait holds an async mutex
//! for its whole duration, so callers are spaced out even if several tasks
//! share one pacer. Waits are unconditional; they never depend on whether
//! the previous request failed or how long ago the last pause ended.
//!
//! - [`Pacer::wait_short`] follows every remote fetch attempt.
//! - [`Pacer::wait_long`] follows every album/playlist of a multi-batch
//!   operation (artist discography, whole playlist library).
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use zspot_core::pacing::Pacer;
//!
//! # async fn example() {
//! let pacer = Pacer::new(Duration::from_secs(5), Duration::from_secs(30));
//! pacer.wait_short().await;
//! assert_eq!(pacer.short_waits(), 1);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Which interval a wait used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceKind {
    Short,
    Long,
}

impl fmt::Display for PaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Short => "short",
            Self::Long => "long",
        })
    }
}

/// Observer for pauses, e.g. a terminal countdown.
pub trait PaceListener: Send + Sync {
    fn pause_started(&self, kind: PaceKind, duration: Duration);

    fn pause_finished(&self, kind: PaceKind);
}

/// Fixed-interval pacing gate.
pub struct Pacer {
    short: Duration,
    long: Duration,
    disabled: bool,
    /// Held for the whole of each pause.
    gate: Mutex<()>,
    short_waits: AtomicU64,
    long_waits: AtomicU64,
    cumulative_ms: AtomicU64,
    listener: Option<Arc<dyn PaceListener>>,
}

impl fmt::Debug for Pacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pacer")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("disabled", &self.disabled)
            .field("short_waits", &self.short_waits())
            .field("long_waits", &self.long_waits())
            .finish_non_exhaustive()
    }
}

impl Pacer {
    /// Creates a pacer with the given short and long intervals.
    #[must_use]
    #[instrument(skip_all, fields(short_ms = short.as_millis(), long_ms = long.as_millis()))]
    pub fn new(short: Duration, long: Duration) -> Self {
        debug!("creating pacer");
        Self {
            short,
            long,
            disabled: false,
            gate: Mutex::new(()),
            short_waits: AtomicU64::new(0),
            long_waits: AtomicU64::new(0),
            cumulative_ms: AtomicU64::new(0),
            listener: None,
        }
    }

    /// Creates a pacer that never sleeps but still counts waits.
    #[must_use]
    pub fn disabled() -> Self {
        let mut pacer = Self::new(Duration::ZERO, Duration::ZERO);
        pacer.disabled = true;
        pacer
    }

    /// Attaches a listener notified around every non-zero pause.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn PaceListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[must_use]
    pub fn short_interval(&self) -> Duration {
        self.short
    }

    #[must_use]
    pub fn long_interval(&self) -> Duration {
        self.long
    }

    /// Number of short waits performed so far.
    #[must_use]
    pub fn short_waits(&self) -> u64 {
        self.short_waits.load(Ordering::SeqCst)
    }

    /// Number of long waits performed so far.
    #[must_use]
    pub fn long_waits(&self) -> u64 {
        self.long_waits.load(Ordering::SeqCst)
    }

    /// Total time spent waiting.
    #[must_use]
    pub fn cumulative_wait(&self) -> Duration {
        Duration::from_millis(self.cumulative_ms.load(Ordering::SeqCst))
    }

    /// Sleeps the short interval.
    pub async fn wait_short(&self) {
        self.short_waits.fetch_add(1, Ordering::SeqCst);
        self.pause(PaceKind::Short, self.short).await;
    }

    /// Sleeps the long interval.
    pub async fn wait_long(&self) {
        self.long_waits.fetch_add(1, Ordering::SeqCst);
        self.pause(PaceKind::Long, self.long).await;
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn pause(&self, kind: PaceKind, duration: Duration) {
        if self.disabled || duration.is_zero() {
            return;
        }

        let _held = self.gate.lock().await;
        debug!(kind = %kind, delay_ms = duration.as_millis(), "pacing");
        if let Some(listener) = &self.listener {
            listener.pause_started(kind, duration);
        }

        tokio::time::sleep(duration).await;

        self.cumulative_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        if let Some(listener) = &self.listener {
            listener.pause_finished(kind);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use tokio::time::Instant;

    use super::*;

    const SHORT: Duration = Duration::from_secs(5);
    const LONG: Duration = Duration::from_secs(30);

    // ==================== Interval Tests ====================

    #[tokio::test]
    async fn test_pacer_wait_short_sleeps_short_interval() {
        tokio::time::pause();
        let pacer = Pacer::new(SHORT, LONG);

        let start = Instant::now();
        pacer.wait_short().await;

        assert!(start.elapsed() >= SHORT);
        assert!(start.elapsed() < LONG);
        assert_eq!(pacer.short_waits(), 1);
        assert_eq!(pacer.long_waits(), 0);
    }

    #[tokio::test]
    async fn test_pacer_wait_long_sleeps_long_interval() {
        tokio::time::pause();
        let pacer = Pacer::new(SHORT, LONG);

        let start = Instant::now();
        pacer.wait_long().await;

        assert!(start.elapsed() >= LONG);
        assert_eq!(pacer.long_waits(), 1);
        assert_eq!(pacer.cumulative_wait(), LONG);
    }

    #[tokio::test]
    async fn test_pacer_waits_are_unconditional_and_repeat() {
        tokio::time::pause();
        let pacer = Pacer::new(SHORT, LONG);

        let start = Instant::now();
        for _ in 0..3 {
            pacer.wait_short().await;
        }

        assert!(start.elapsed() >= SHORT * 3);
        assert_eq!(pacer.short_waits(), 3);
    }

    #[tokio::test]
    async fn test_pacer_wait_is_pending_until_interval_elapses() {
        tokio::time::pause();
        let pacer = Pacer::new(SHORT, LONG);

        let mut wait = tokio_test::task::spawn(pacer.wait_short());
        tokio_test::assert_pending!(wait.poll());

        tokio::time::advance(SHORT - Duration::from_millis(1)).await;
        tokio_test::assert_pending!(wait.poll());

        // Sleep deadlines are rounded up to the next millisecond.
        tokio::time::advance(Duration::from_millis(2)).await;
        tokio_test::assert_ready!(wait.poll());
    }

    #[tokio::test]
    async fn test_pacer_concurrent_waiters_are_serialized() {
        tokio::time::pause();
        let pacer = Arc::new(Pacer::new(SHORT, LONG));

        let start = Instant::now();
        let a = tokio::spawn({
            let pacer = Arc::clone(&pacer);
            async move { pacer.wait_short().await }
        });
        let b = tokio::spawn({
            let pacer = Arc::clone(&pacer);
            async move { pacer.wait_short().await }
        });
        a.await.unwrap();
        b.await.unwrap();

        assert!(start.elapsed() >= SHORT * 2);
    }

    // ==================== Disabled Tests ====================

    #[tokio::test]
    async fn test_pacer_disabled_counts_without_sleeping() {
        tokio::time::pause();
        let pacer = Pacer::disabled();
        assert!(pacer.is_disabled());

        let start = Instant::now();
        pacer.wait_short().await;
        pacer.wait_long().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(pacer.short_waits(), 1);
        assert_eq!(pacer.long_waits(), 1);
        assert_eq!(pacer.cumulative_wait(), Duration::ZERO);
    }

    // ==================== Listener Tests ====================

    #[derive(Default)]
    struct RecordingListener {
        events: StdMutex<Vec<String>>,
    }

    impl PaceListener for RecordingListener {
        fn pause_started(&self, kind: PaceKind, duration: Duration) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {kind} {}", duration.as_secs()));
        }

        fn pause_finished(&self, kind: PaceKind) {
            self.events.lock().unwrap().push(format!("end {kind}"));
        }
    }

    #[tokio::test]
    async fn test_pacer_notifies_listener_around_pause() {
        tokio::time::pause();
        let listener = Arc::new(RecordingListener::default());
        let pacer = Pacer::new(SHORT, LONG).with_listener(listener.clone());

        pacer.wait_long().await;

        assert_eq!(
            *listener.events.lock().unwrap(),
            vec!["start long 30".to_string(), "end long".to_string()]
        );
    }
}
