use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::instrument;

use crate::event::Event;

/// Errors from the event store. sqlx errors are wrapped with the command that failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed with: {error}")]
    ConnectionError { error: sqlx::Error },
    #[error("{command} query failed with: {error}")]
    QueryError {
        command: &'static str,
        error: sqlx::Error,
    },
}

#[async_trait]
pub trait EventStore {
    async fn persist(&self, event: &Event) -> Result<(), StoreError>;

    /// Distinct stored event names starting with `prefix`, case-insensitively.
    async fn search_event_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Events stored in the `events` PostgreSQL table.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|error| StoreError::ConnectionError { error })?;

        Ok(Self { pool })
    }

    pub fn new_from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip_all, fields(event = %event.event))]
    async fn persist(&self, event: &Event) -> Result<(), StoreError> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| StoreError::ConnectionError { error })?;

        sqlx::query(
            r#"
INSERT INTO events
    (event, timestamp, revenue, custom_data)
VALUES
    ($1, $2, $3, $4)
            "#,
        )
        .bind(&event.event)
        .bind(event.timestamp)
        .bind(event.revenue)
        .bind(sqlx::types::Json(&event.custom_data))
        .execute(&mut *connection)
        .await
        .map_err(|error| StoreError::QueryError {
            command: "INSERT",
            error,
        })?;

        Ok(())
    }

    #[instrument(skip_all)]
    async fn search_event_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| StoreError::ConnectionError { error })?;

        let names: Vec<String> = sqlx::query_scalar(
            r#"
SELECT DISTINCT
    event
FROM
    events
WHERE
    lower(event) LIKE lower($1) ESCAPE '\'
ORDER BY
    event
            "#,
        )
        .bind(prefix_pattern(prefix))
        .fetch_all(&mut *connection)
        .await
        .map_err(|error| StoreError::QueryError {
            command: "SELECT",
            error,
        })?;

        Ok(names)
    }
}

/// LIKE pattern matching names that start with `prefix` taken literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
