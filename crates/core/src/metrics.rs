//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Bulk processing runs and per-item outcomes
//! - Worker pool submissions

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Bulk Processing Metrics
// =============================================================================

/// Bulk runs total by result.
pub static BULK_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("itemflow_bulk_runs_total", "Total bulk processing runs"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Items handled by bulk runs, by outcome.
pub static BULK_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "itemflow_bulk_items_total",
            "Items handled by bulk processing",
        ),
        &["outcome"], // "processed", "not_found", "validation", "persistence", ...
    )
    .unwrap()
});

/// Bulk run duration in seconds.
pub static BULK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "itemflow_bulk_duration_seconds",
            "Duration of a bulk processing run",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Worker Pool Metrics
// =============================================================================

/// Submissions refused because the backlog was full.
pub static POOL_SUBMISSIONS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "itemflow_pool_submissions_rejected_total",
            "Task submissions rejected by a saturated worker pool",
        ),
        &["pool"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Bulk processing
        Box::new(BULK_RUNS.clone()),
        Box::new(BULK_ITEMS.clone()),
        Box::new(BULK_DURATION.clone()),
        // Worker pool
        Box::new(POOL_SUBMISSIONS_REJECTED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        BULK_RUNS.with_label_values(&["completed"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "itemflow_bulk_runs_total"));
    }
}
