//! Metrics definitions for the tracker client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const TRACKER_REQUEST_DURATION: MetricDef = MetricDef {
    name: "tracker.request.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of tracking service calls in seconds. Tagged with operation, outcome.",
};

pub const ALL_METRICS: &[MetricDef] = &[TRACKER_REQUEST_DURATION];
