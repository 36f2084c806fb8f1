//! Metrics and observability utilities
//!
//! Records query and traversal metrics through the `metrics` facade.
//! Without an installed recorder every call is a no-op.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all Evidence Nexus metrics
pub const METRICS_PREFIX: &str = "nexus";

/// Histogram buckets for in-memory query latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.000_01, // 10us
    0.000_05, // 50us
    0.000_1,  // 100us
    0.000_5,  // 500us
    0.001,    // 1ms
    0.005,    // 5ms
    0.010,    // 10ms
    0.050,    // 50ms
    0.100,    // 100ms
    0.500,    // 500ms
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of evidence queries executed"
    );

    describe_histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Evidence query latency in seconds"
    );

    describe_gauge!(
        format!("{}_query_matches", METRICS_PREFIX),
        Unit::Count,
        "Nodes matching the last query before pagination"
    );

    describe_counter!(
        format!("{}_dropped_fragments_total", METRICS_PREFIX),
        Unit::Count,
        "Unparseable query fragments dropped in lenient mode"
    );

    describe_counter!(
        format!("{}_traversals_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of causal traversals"
    );

    describe_histogram!(
        format!("{}_traversal_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Causal traversal latency in seconds"
    );

    describe_gauge!(
        format!("{}_traversal_nodes", METRICS_PREFIX),
        Unit::Count,
        "Nodes visited by the last traversal"
    );

    tracing::debug!("Metrics registered");
}

/// Helper to record query metrics
pub fn record_query(duration_secs: f64, total_count: usize, returned: usize) {
    counter!(format!("{}_queries_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_query_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_query_matches", METRICS_PREFIX)).set(total_count as f64);

    counter!(format!("{}_query_results_total", METRICS_PREFIX)).increment(returned as u64);
}

/// Helper to record fragments the parser had to drop
pub fn record_dropped_fragments(count: usize) {
    if count == 0 {
        return;
    }
    counter!(format!("{}_dropped_fragments_total", METRICS_PREFIX)).increment(count as u64);
}

/// Helper to record traversal metrics
pub fn record_traversal(duration_secs: f64, direction: &str, nodes: usize, edges: usize) {
    counter!(
        format!("{}_traversals_total", METRICS_PREFIX),
        "direction" => direction.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_traversal_duration_seconds", METRICS_PREFIX),
        "direction" => direction.to_string()
    )
    .record(duration_secs);

    gauge!(format!("{}_traversal_nodes", METRICS_PREFIX)).set(nodes as f64);

    counter!(format!("{}_traversal_edges_total", METRICS_PREFIX)).increment(edges as u64);
}
