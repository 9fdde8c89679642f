//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording dispatch counters
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    completed: AtomicU64,
    failed: AtomicU64,
    validations_rejected: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "dispatch_completed", "Metric incremented");
    }

    pub fn dispatch_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "dispatch_failed", "Metric incremented");
    }

    pub fn validation_rejected(&self) {
        self.validations_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "validation_rejected", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            validations_rejected: self.validations_rejected.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub validations_rejected: u64,
}
