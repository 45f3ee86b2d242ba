use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{BatchValidationError, ValidationError};
use crate::metrics::report_rejected_request;
use crate::pipeline::{ShapeError, Timeline};
use crate::source::SourceError;
use crate::store::StoreError;

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub msg: String,
    pub err: String,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct AutocompleteResponse {
    pub events: Vec<String>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct TimelineResponse {
    pub timeline: Timeline,
}

#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("failed to decode request: {0}")]
    RequestDecodingError(String),
    #[error("failed to parse request: {0}")]
    RequestParsingError(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidEvent(#[from] ValidationError),

    #[error(transparent)]
    PersistError(StoreError),
    #[error(transparent)]
    AutocompleteError(StoreError),

    #[error(transparent)]
    SourceError(#[from] SourceError),
    #[error(transparent)]
    InvalidBatch(#[from] BatchValidationError),
    #[error(transparent)]
    ShapeError(#[from] ShapeError),
}

impl TimelineError {
    /// Short label used in the rejection metric.
    pub fn cause(&self) -> &'static str {
        match self {
            TimelineError::RequestDecodingError(_) | TimelineError::RequestParsingError(_) => {
                "request_invalid"
            }
            TimelineError::InvalidEvent(_) => "event_invalid",
            TimelineError::PersistError(_) => "persist_failed",
            TimelineError::AutocompleteError(_) => "autocomplete_failed",
            TimelineError::SourceError(_) => "source_failed",
            TimelineError::InvalidBatch(_) => "batch_invalid",
            TimelineError::ShapeError(_) => "batch_shape_invalid",
        }
    }

    fn context(&self) -> &'static str {
        match self {
            TimelineError::RequestDecodingError(_) | TimelineError::RequestParsingError(_) => {
                "Error on retrieving the Event from request"
            }
            TimelineError::InvalidEvent(_) => "Error on validating the Event from request",
            TimelineError::PersistError(_) => "Error on saving the Event from request",
            TimelineError::AutocompleteError(_) => "Error on searching the Event autocomplete",
            TimelineError::SourceError(SourceError::Decoding(_))
            | TimelineError::SourceError(SourceError::Parsing(_)) => {
                "Error on parsing the Events from request"
            }
            TimelineError::SourceError(_) => "Error on retrieving the Events from request",
            TimelineError::InvalidBatch(_) => "Error on validating the Events from request",
            TimelineError::ShapeError(_) => "Error on grouping the Events",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            TimelineError::RequestDecodingError(_)
            | TimelineError::RequestParsingError(_)
            | TimelineError::InvalidEvent(_) => StatusCode::BAD_REQUEST,

            TimelineError::PersistError(_) | TimelineError::AutocompleteError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            TimelineError::SourceError(_) => StatusCode::BAD_GATEWAY,

            TimelineError::InvalidBatch(_) | TimelineError::ShapeError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

impl IntoResponse for TimelineError {
    fn into_response(self) -> Response {
        report_rejected_request(self.cause());

        let status = self.status();
        let body = ErrorResponse {
            msg: self.context().to_string(),
            err: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;

    use super::*;
    use crate::event::AttributeError;

    #[tokio::test]
    async fn validation_errors_answer_bad_request_with_message() {
        let response = TimelineError::InvalidEvent(ValidationError::MissingEventName).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            ErrorResponse {
                msg: "Error on validating the Event from request".to_string(),
                err: "Field event should not be empty".to_string(),
            }
        );
    }

    #[test]
    fn batch_errors_map_to_upstream_statuses() {
        let shape = TimelineError::ShapeError(ShapeError {
            position: 3,
            event: "comprou".to_string(),
            source: AttributeError::Missing("store_name".to_string()),
        });
        assert_eq!(shape.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            shape.to_string(),
            "event #3 (comprou) has an invalid shape: missing required attribute `store_name`"
        );

        let source = TimelineError::SourceError(SourceError::TooLarge { limit: 1024 });
        assert_eq!(source.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(source.context(), "Error on retrieving the Events from request");
    }
}
