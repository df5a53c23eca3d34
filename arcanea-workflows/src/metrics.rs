//! Orchestrator counters

use arcanea_core::DurationMs;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime counters for one orchestrator. There is no reset.
#[derive(Debug, Default)]
pub(crate) struct MetricsRecorder {
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    completed_duration_total: AtomicU64,
}

impl MetricsRecorder {
    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self, duration_ms: DurationMs) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.completed_duration_total
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, active: usize, registered: usize) -> WorkflowMetrics {
        let started = self.started.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let total = self.completed_duration_total.load(Ordering::Relaxed);
        WorkflowMetrics {
            workflows_started: started,
            workflows_completed: completed,
            workflows_failed: self.failed.load(Ordering::Relaxed),
            workflows_cancelled: self.cancelled.load(Ordering::Relaxed),
            avg_execution_time_ms: if completed == 0 {
                0.0
            } else {
                total as f64 / completed as f64
            },
            active_workflows: active,
            registered_workflows: registered,
            success_rate: if started == 0 {
                0.0
            } else {
                completed as f64 / started as f64 * 100.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetrics {
    pub workflows_started: u64,
    pub workflows_completed: u64,
    pub workflows_failed: u64,
    pub workflows_cancelled: u64,
    /// Mean duration of completed runs
    pub avg_execution_time_ms: f64,
    pub active_workflows: usize,
    pub registered_workflows: usize,
    /// Completed over started, as a percentage
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_and_success_rate() {
        let metrics = MetricsRecorder::default();
        for _ in 0..4 {
            metrics.record_started();
        }
        metrics.record_completed(100);
        metrics.record_completed(300);
        metrics.record_failed();
        metrics.record_cancelled();

        let snap = metrics.snapshot(0, 4);
        assert_eq!(snap.avg_execution_time_ms, 200.0);
        assert_eq!(snap.success_rate, 50.0);
        assert_eq!(snap.workflows_failed, 1);
        assert_eq!(snap.workflows_cancelled, 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = MetricsRecorder::default().snapshot(0, 0);
        assert_eq!(snap.success_rate, 0.0);
        assert_eq!(snap.avg_execution_time_ms, 0.0);
    }
}
