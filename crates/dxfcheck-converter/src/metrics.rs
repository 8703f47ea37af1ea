//! Per-run task counters and durations.
//!
//! Counters are atomics; duration samples sit behind a mutex. Safe to update
//! from every task of a run concurrently.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dxfcheck_core::config::harness::AdapterKind;
use serde::Serialize;

/// Task metrics of one harness run.
#[derive(Debug, Default)]
pub struct RunMetrics {
    tasks_started: AtomicU64,
    tasks_succeeded: AtomicU64,
    tasks_failed: AtomicU64,
    adapter_failures: Mutex<BTreeMap<String, u64>>,
    durations: Mutex<Vec<Duration>>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(&self) {
        self.tasks_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, duration: Duration) {
        self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut samples) = self.durations.lock() {
            samples.push(duration);
        }
    }

    pub fn record_failure(&self, adapter: AdapterKind) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut failures) = self.adapter_failures.lock() {
            *failures.entry(adapter.to_string()).or_insert(0) += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut durations = self
            .durations
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        durations.sort();

        let percentile = |p: usize| -> Option<u64> {
            let len = durations.len();
            if len == 0 {
                return None;
            }
            durations
                .get((len - 1) * p / 100)
                .map(|d| d.as_millis() as u64)
        };

        MetricsSnapshot {
            tasks_started: self.tasks_started.load(Ordering::Relaxed),
            tasks_succeeded: self.tasks_succeeded.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            failures_by_adapter: self
                .adapter_failures
                .lock()
                .map(|f| f.clone())
                .unwrap_or_default(),
            duration_p50_ms: percentile(50),
            duration_p95_ms: percentile(95),
            duration_max_ms: durations.last().map(|d| d.as_millis() as u64),
        }
    }
}

/// Serializable point-in-time copy of [`RunMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub tasks_started: u64,
    pub tasks_succeeded: u64,
    pub tasks_failed: u64,
    pub failures_by_adapter: BTreeMap<String, u64>,
    /// Median successful task duration.
    pub duration_p50_ms: Option<u64>,
    pub duration_p95_ms: Option<u64>,
    pub duration_max_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_percentiles() {
        let metrics = RunMetrics::new();
        for ms in [40, 10, 30, 20] {
            metrics.record_started();
            metrics.record_success(Duration::from_millis(ms));
        }
        metrics.record_started();
        metrics.record_failure(AdapterKind::Tool);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_started, 5);
        assert_eq!(snapshot.tasks_succeeded, 4);
        assert_eq!(snapshot.tasks_failed, 1);
        assert_eq!(snapshot.failures_by_adapter.get("tool"), Some(&1));
        assert_eq!(snapshot.duration_p50_ms, Some(20));
        assert_eq!(snapshot.duration_max_ms, Some(40));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = RunMetrics::new().snapshot();
        assert_eq!(snapshot.tasks_started, 0);
        assert!(snapshot.duration_p50_ms.is_none());
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["tasks_failed"], 0);
    }
}
