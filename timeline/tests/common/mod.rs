#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use timeline::event::Event;
use timeline::handlers::router;
use timeline::source::{BatchSource, SourceError};
use timeline::store::{EventStore, StoreError};

pub static EVENTS_FIXTURE: &str = include_str!("../fixtures/events.json");

#[derive(Clone, Default)]
pub struct MemoryStore {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemoryStore {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: Arc::new(Mutex::new(events)),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn persist(&self, event: &Event) -> Result<(), StoreError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn search_event_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let prefix = prefix.to_lowercase();
        let mut names: Vec<String> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.event.to_lowercase().starts_with(&prefix))
            .map(|event| event.event.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Serves a fixed body, or fails as if upstream sent too much.
#[derive(Clone)]
pub struct StaticSource {
    body: Option<Bytes>,
}

impl StaticSource {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    pub fn oversized() -> Self {
        Self { body: None }
    }
}

#[async_trait]
impl BatchSource for StaticSource {
    async fn fetch_batch(&self) -> Result<Bytes, SourceError> {
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => Err(SourceError::TooLarge { limit: 0 }),
        }
    }
}

pub fn app(store: MemoryStore, source: StaticSource) -> Router {
    router(store, source, 2, 1_048_576, None)
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Bytes) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Bytes) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}
