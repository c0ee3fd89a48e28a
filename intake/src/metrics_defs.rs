use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "intake.request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with mode.",
};

pub const SYNC_OUTCOME: MetricDef = MetricDef {
    name: "intake.sync.outcome",
    metric_type: MetricType::Counter,
    description: "Finished synchronizations. Tagged with outcome.",
};

pub const FIELD_DEGRADED: MetricDef = MetricDef {
    name: "intake.field.degraded",
    metric_type: MetricType::Counter,
    description: "Single-column writes issued after a failed batch. Tagged with result.",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUEST_DURATION, SYNC_OUTCOME, FIELD_DEGRADED];
