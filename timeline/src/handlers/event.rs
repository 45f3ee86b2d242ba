use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use tracing::instrument;

use crate::api::{AutocompleteResponse, MessageResponse, TimelineError};
use crate::event::RawEvent;
use crate::metrics::report_event_stored;

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AutocompleteQuery {
    pub event: Option<String>,
}

/// Validate and store one event.
#[instrument(skip_all, fields(event_name))]
pub async fn post(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, TimelineError> {
    let event = RawEvent::from_bytes(body)?.validate().map_err(|err| {
        tracing::warn!("rejected invalid event: {}", err);
        err
    })?;

    tracing::Span::current().record("event_name", event.event.as_str());

    state.store.persist(&event).await.map_err(|err| {
        tracing::error!("failed to persist event: {}", err);
        TimelineError::PersistError(err)
    })?;

    report_event_stored();

    Ok(Json(MessageResponse {
        msg: String::from("Event saved successfully!"),
    }))
}

/// Suggest stored event names starting with `?event=`. Prefixes shorter than the
/// configured minimum get an empty body.
#[instrument(skip_all, fields(prefix))]
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Response, TimelineError> {
    let prefix = query.event.unwrap_or_default();
    tracing::Span::current().record("prefix", prefix.as_str());

    if prefix.chars().count() < state.min_autocomplete_prefix {
        return Ok(StatusCode::OK.into_response());
    }

    let events = state
        .store
        .search_event_names_by_prefix(&prefix)
        .await
        .map_err(|err| {
            tracing::error!("failed to search event names: {}", err);
            TimelineError::AutocompleteError(err)
        })?;

    Ok(Json(AutocompleteResponse { events }).into_response())
}
