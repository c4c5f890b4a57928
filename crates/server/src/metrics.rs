//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the itemflow server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Worker pool status (collected dynamically)
//! - Item counts by status (collected dynamically)
//! - Core bulk processing metrics, registered from `itemflow_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

use itemflow_core::ItemStatus;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "itemflow_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("itemflow_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "itemflow_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Worker Pool Metrics
// =============================================================================

/// Tasks currently running on the worker pool.
pub static POOL_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "itemflow_pool_active_tasks",
        "Number of tasks currently running on the worker pool",
    )
    .unwrap()
});

/// Tasks waiting in the worker pool backlog.
pub static POOL_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "itemflow_pool_queued_tasks",
        "Number of tasks waiting in the worker pool backlog",
    )
    .unwrap()
});

// =============================================================================
// Item Metrics
// =============================================================================

/// Stored items by status.
pub static ITEMS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("itemflow_items_by_status", "Number of stored items by status"),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Worker pool
    registry.register(Box::new(POOL_ACTIVE.clone())).unwrap();
    registry.register(Box::new(POOL_QUEUED.clone())).unwrap();

    // Items
    registry
        .register(Box::new(ITEMS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (bulk runs, pool rejections)
    for metric in itemflow_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values
/// from the worker pool and the repository.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.pool().status();
    POOL_ACTIVE.set(status.active_tasks as i64);
    POOL_QUEUED.set(status.queued_tasks as i64);

    let repository = state.repository();
    let items = tokio::task::spawn_blocking(move || repository.find_all()).await;

    match items {
        Ok(Ok(items)) => {
            for item_status in ItemStatus::ALL {
                let count = items.iter().filter(|i| i.status == item_status).count();
                ITEMS_BY_STATUS
                    .with_label_values(&[item_status.as_str()])
                    .set(count as i64);
            }
        }
        Ok(Err(e)) => warn!("Failed to count items for metrics: {}", e),
        Err(e) => warn!("Item count task failed: {}", e),
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    static UUID_PATTERN: Lazy<regex_lite::Regex> = Lazy::new(|| {
        regex_lite::Regex::new(
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        )
        .unwrap()
    });

    UUID_PATTERN.replace_all(path, "{id}").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/items/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/items/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/items/process"), "/api/items/process");
        assert_eq!(normalize_path("/api/health"), "/api/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("itemflow_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs metrics that have been accessed
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        POOL_ACTIVE.set(0);
        POOL_QUEUED.set(0);
        ITEMS_BY_STATUS.with_label_values(&["NEW"]).set(0);
        itemflow_core::metrics::BULK_RUNS
            .with_label_values(&["completed"])
            .inc_by(0);

        let output = encode_metrics();

        assert!(output.contains("itemflow_http_request_duration_seconds"));
        assert!(output.contains("itemflow_http_requests_in_flight"));
        assert!(output.contains("itemflow_pool_active_tasks"));
        assert!(output.contains("itemflow_pool_queued_tasks"));
        assert!(output.contains("itemflow_items_by_status"));
        assert!(output.contains("itemflow_bulk_runs_total"));
    }
}
