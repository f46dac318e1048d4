use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "requests",
    metric_type: MetricType::Counter,
    description: "Handled API requests. Tagged with operation, outcome.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "API request duration in seconds. Tagged with operation, outcome.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS, REQUEST_DURATION, REQUESTS_INFLIGHT];
