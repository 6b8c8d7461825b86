use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "geed_http_requests_total",
        "Total HTTP requests by route and status",
        &["method", "route", "status"]
    )
    .expect("register http_requests_total")
});

pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "geed_http_request_duration_seconds",
        "Request duration in seconds",
        &["method", "route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register http_request_duration")
});

/// Per-route counters; installed with `route_layer` so the matched path is known.
pub async fn track(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".into());
    let method = req.method().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &route])
        .observe(started.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &route, res.status().as_str()])
        .inc();
    res
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
