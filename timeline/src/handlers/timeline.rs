use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::api::{TimelineError, TimelineResponse};
use crate::event::Events;
use crate::metrics::report_timeline_built;
use crate::pipeline::build_timeline;

use super::AppState;

/// Fetch the current event batch and answer with its purchase timeline.
#[instrument(skip_all, fields(batch_size, transactions))]
pub async fn group_events(
    State(state): State<AppState>,
) -> Result<Json<TimelineResponse>, TimelineError> {
    let body = state.source.fetch_batch().await.map_err(|err| {
        tracing::error!("failed to fetch event batch: {}", err);
        err
    })?;

    let batch = Events::from_bytes(body)?.validate()?;
    let batch_size = batch.len();
    tracing::Span::current().record("batch_size", batch_size);

    let timeline = build_timeline(batch).map_err(|err| {
        tracing::warn!("rejected event batch: {}", err);
        err
    })?;
    tracing::Span::current().record("transactions", timeline.len());

    report_timeline_built(batch_size, timeline.len());

    Ok(Json(TimelineResponse { timeline }))
}
