use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

pub const TIMELINE_REQUESTS_REJECTED_TOTAL: &str = "timeline_requests_rejected_total";

pub fn report_rejected_request(cause: &'static str) {
    counter!(TIMELINE_REQUESTS_REJECTED_TOTAL, "cause" => cause).increment(1);
}

pub fn report_event_stored() {
    counter!("timeline_events_stored_total").increment(1);
}

pub fn report_timeline_built(batch_size: usize, transactions: usize) {
    counter!("timeline_batches_built_total").increment(1);
    histogram!("timeline_batch_size").record(batch_size as f64);
    histogram!("timeline_transactions_per_batch").record(transactions as f64);
}

pub fn setup_metrics_recorder() -> PrometheusHandle {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];
    const BATCH_SIZES: &[f64] = &[
        1.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
    ];

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_requests_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )
        .expect("failed to set http duration buckets")
        .set_buckets_for_metric(Matcher::Prefix("timeline_".to_string()), BATCH_SIZES)
        .expect("failed to set batch size buckets")
        .install_recorder()
        .expect("failed to install prometheus recorder")
}

/// Middleware to record some common HTTP metrics
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}
