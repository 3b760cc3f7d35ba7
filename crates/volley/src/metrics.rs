use crate::engine::sender::RequestOutcome;
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref REQUESTS_SENT: IntCounter = IntCounter::new(
        "volley_requests_total",
        "Total number of requests launched"
    )
    .expect("metric can be created");
    pub static ref REQUEST_FAILURES: IntCounter = IntCounter::new(
        "volley_request_failures_total",
        "Total number of requests that failed at the transport or parse level"
    )
    .expect("metric can be created");
    /// Sender tasks launched but not yet reported back
    pub static ref IN_FLIGHT: IntGauge = IntGauge::new(
        "volley_in_flight_requests",
        "Number of requests currently in flight"
    )
    .expect("metric can be created");
    /// Parsed responses by HTTP status code
    pub static ref RESPONSES_BY_STATUS: IntCounterVec = IntCounterVec::new(
        Opts::new("volley_responses_total", "Total number of responses by status code"),
        &["status"]
    )
    .expect("metric can be created");
    pub static ref REQUEST_DURATION: Histogram = Histogram::with_opts(HistogramOpts::new(
        "volley_request_duration_seconds",
        "Latency of successful requests"
    ))
    .expect("metric can be created");
}

pub fn register_metrics() {
    let _ = REGISTRY.register(Box::new(REQUESTS_SENT.clone()));
    let _ = REGISTRY.register(Box::new(REQUEST_FAILURES.clone()));
    let _ = REGISTRY.register(Box::new(IN_FLIGHT.clone()));
    let _ = REGISTRY.register(Box::new(RESPONSES_BY_STATUS.clone()));
    let _ = REGISTRY.register(Box::new(REQUEST_DURATION.clone()));
}

pub fn record_outcome(outcome: &RequestOutcome) {
    match outcome {
        RequestOutcome::Success { elapsed, status } => {
            RESPONSES_BY_STATUS
                .with_label_values(&[status.as_str()])
                .inc();
            REQUEST_DURATION.observe(elapsed.as_secs_f64());
        }
        RequestOutcome::Failure { .. } => REQUEST_FAILURES.inc(),
    }
}

pub fn render_metrics() -> String {
    let metric_families = REGISTRY.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|_| "# Error: Invalid UTF8".to_string())
}
