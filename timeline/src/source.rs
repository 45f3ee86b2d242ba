use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to build http client: {0}")]
    ClientError(reqwest::Error),
    #[error("failed to fetch event batch: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("event batch is larger than {limit} bytes")]
    TooLarge { limit: usize },
    #[error("failed to decode event batch: {0}")]
    Decoding(String),
    #[error("failed to parse event batch: {0}")]
    Parsing(#[from] serde_json::Error),
}

/// Where `/groupEvents` gets the raw batch it turns into a timeline.
#[async_trait]
pub trait BatchSource {
    async fn fetch_batch(&self) -> Result<Bytes, SourceError>;
}

/// Fetches the batch document over HTTP, reading at most `max_bytes` of body.
pub struct HttpBatchSource {
    client: reqwest::Client,
    url: String,
    max_bytes: usize,
}

impl HttpBatchSource {
    pub fn new(url: String, timeout: Duration, max_bytes: usize) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("timeline batch source")
            .timeout(timeout)
            .build()
            .map_err(SourceError::ClientError)?;

        Ok(Self {
            client,
            url,
            max_bytes,
        })
    }
}

#[async_trait]
impl BatchSource for HttpBatchSource {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn fetch_batch(&self) -> Result<Bytes, SourceError> {
        let mut response = self.client.get(&self.url).send().await?.error_for_status()?;

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(SourceError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                tracing::warn!(limit = self.max_bytes, "event batch exceeds size limit");
                return Err(SourceError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(len = body.len(), "fetched event batch");
        Ok(body.freeze())
    }
}
