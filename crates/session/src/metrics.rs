use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Counters for one session.
#[derive(Default)]
pub struct SessionMetrics {
    submissions_accepted: AtomicUsize,
    submissions_ignored: AtomicUsize,
    validation_rejections: AtomicUsize,
    successes: AtomicUsize,
    failures: AtomicUsize,
    triplets_received: AtomicUsize,

    // microseconds
    total_extract_time_us: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.submissions_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.submissions_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_rejection(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extract(&self, duration: Duration, success: bool, triplets: usize) {
        self.total_extract_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
            self.triplets_received.fetch_add(triplets, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let completed = successes + failures;
        let total_us = self.total_extract_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            submissions_accepted: self.submissions_accepted.load(Ordering::Relaxed),
            submissions_ignored: self.submissions_ignored.load(Ordering::Relaxed),
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            successes,
            failures,
            triplets_received: self.triplets_received.load(Ordering::Relaxed),
            avg_extract_time_ms: if completed > 0 {
                total_us / completed as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub submissions_accepted: usize,
    pub submissions_ignored: usize,
    pub validation_rejections: usize,
    pub successes: usize,
    pub failures: usize,
    pub triplets_received: usize,
    pub avg_extract_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_covers_successes_and_failures() {
        let metrics = SessionMetrics::new();
        metrics.record_extract(Duration::from_millis(10), true, 4);
        metrics.record_extract(Duration::from_millis(30), false, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.triplets_received, 4);
        assert!((snapshot.avg_extract_time_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = SessionMetrics::new().snapshot();
        assert_eq!(snapshot.submissions_accepted, 0);
        assert_eq!(snapshot.avg_extract_time_ms, 0.0);
    }
}
