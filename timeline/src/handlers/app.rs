use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{routing, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::metrics::track_metrics;
use crate::source::BatchSource;
use crate::store::EventStore;

use super::{event, timeline};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore + Send + Sync>,
    pub source: Arc<dyn BatchSource + Send + Sync>,
    pub min_autocomplete_prefix: usize,
}

pub fn router<S, B>(
    store: S,
    source: B,
    min_autocomplete_prefix: usize,
    max_event_bytes: usize,
    metrics: Option<PrometheusHandle>,
) -> Router
where
    S: EventStore + Send + Sync + 'static,
    B: BatchSource + Send + Sync + 'static,
{
    let state = AppState {
        store: Arc::new(store),
        source: Arc::new(source),
        min_autocomplete_prefix,
    };

    Router::new()
        .route("/", routing::get(index))
        .route("/_liveness", routing::get(liveness))
        .route(
            "/metrics",
            routing::get(move || match metrics {
                Some(ref recorder_handle) => std::future::ready(recorder_handle.render()),
                None => std::future::ready("no metrics recorder installed".to_owned()),
            }),
        )
        .route(
            "/event",
            routing::post(event::post)
                .get(event::autocomplete)
                .layer(DefaultBodyLimit::max(max_event_bytes)),
        )
        .route("/groupEvents", routing::get(timeline::group_events))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state)
}

pub async fn index() -> &'static str {
    "timeline"
}

pub async fn liveness() -> &'static str {
    "ok"
}
