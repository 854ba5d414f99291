//! Rate-limited reporting of datagrams a sender refused.
//!
//! Drops are counted per [`DropReason`] and summarised through a callback at
//! most once per interval, so a sender stuck behind a full queue produces one
//! log line per interval rather than one per record.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default interval between dropped-message warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Why a datagram never reached the socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    QueueFull,
    Closed,
}

/// Drops accumulated since the previous summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub queue_full: u64,
    pub closed: u64,
}

impl DropCounts {
    pub fn total(&self) -> u64 {
        self.queue_full + self.closed
    }
}

impl fmt::Display for DropCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} datagrams ({} queue full, {} closed)",
            self.total(),
            self.queue_full,
            self.closed
        )
    }
}

/// Counts dropped datagrams and emits a summary at most once per interval.
///
/// The first summary may be emitted immediately. [`flush`] bypasses the
/// interval and is used when the sender is torn down.
///
/// [`flush`]: RateLimitedWarner::flush
#[derive(Debug)]
pub struct RateLimitedWarner {
    interval_ms: u64,
    last_warn_ms: AtomicU64,
    queue_full: AtomicU64,
    closed: AtomicU64,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    pub fn new(interval: Duration) -> Self {
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        Self {
            interval_ms,
            last_warn_ms: AtomicU64::new(now_millis().saturating_sub(interval_ms)),
            queue_full: AtomicU64::new(0),
            closed: AtomicU64::new(0),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn record_drop(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::QueueFull => &self.queue_full,
            DropReason::Closed => &self.closed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Drops recorded since the last summary, without resetting them.
    pub fn pending(&self) -> DropCounts {
        DropCounts {
            queue_full: self.queue_full.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Relaxed),
        }
    }

    fn take(&self) -> DropCounts {
        DropCounts {
            queue_full: self.queue_full.swap(0, Ordering::Relaxed),
            closed: self.closed.swap(0, Ordering::Relaxed),
        }
    }

    /// Summarise drops if the interval has elapsed since the last summary.
    pub fn warn_if_due(&self, warn: impl FnOnce(DropCounts)) {
        let now = now_millis();
        let prev = self.last_warn_ms.load(Ordering::Relaxed);
        if now.saturating_sub(prev) < self.interval_ms {
            return;
        }
        // Only the thread that claims the slot reports.
        if self
            .last_warn_ms
            .compare_exchange(prev, now, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        let counts = self.take();
        if counts.total() > 0 {
            warn(counts);
        }
    }

    /// Summarise any pending drops immediately.
    pub fn flush(&self, warn: impl FnOnce(DropCounts)) {
        let counts = self.take();
        if counts.total() > 0 {
            warn(counts);
            self.last_warn_ms.store(now_millis(), Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn collect(warner: &RateLimitedWarner) -> Option<DropCounts> {
        let mut seen = None;
        warner.warn_if_due(|counts| seen = Some(counts));
        seen
    }

    #[rstest]
    fn first_summary_is_immediate_and_split_by_reason() {
        let warner = RateLimitedWarner::default();
        warner.record_drop(DropReason::QueueFull);
        warner.record_drop(DropReason::QueueFull);
        warner.record_drop(DropReason::Closed);
        let counts = collect(&warner).expect("summary emitted");
        assert_eq!(
            counts,
            DropCounts {
                queue_full: 2,
                closed: 1
            }
        );
        assert_eq!(
            counts.to_string(),
            "3 datagrams (2 queue full, 1 closed)"
        );
    }

    #[rstest]
    fn later_summaries_wait_for_the_interval() {
        let warner = RateLimitedWarner::new(Duration::from_secs(60));
        warner.record_drop(DropReason::Closed);
        assert!(collect(&warner).is_some());
        warner.record_drop(DropReason::Closed);
        assert!(collect(&warner).is_none());
        assert_eq!(warner.pending().closed, 1);
    }

    #[rstest]
    fn sub_second_intervals_are_kept() {
        let warner = RateLimitedWarner::new(Duration::from_millis(500));
        assert_eq!(warner.interval(), Duration::from_millis(500));
        warner.record_drop(DropReason::QueueFull);
        assert!(collect(&warner).is_some());
        warner.record_drop(DropReason::QueueFull);
        assert!(collect(&warner).is_none(), "still inside the interval");
        std::thread::sleep(Duration::from_millis(600));
        assert_eq!(collect(&warner).map(|c| c.queue_full), Some(1));
    }

    #[rstest]
    fn flush_reports_pending_drops() {
        let warner = RateLimitedWarner::new(Duration::from_secs(60));
        warner.record_drop(DropReason::QueueFull);
        let mut seen = None;
        warner.flush(|counts| seen = Some(counts));
        assert_eq!(seen.map(|c| c.total()), Some(1));
        assert_eq!(warner.pending(), DropCounts::default());
    }
}
