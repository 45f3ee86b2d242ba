use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::instrument;

use crate::api::TimelineError;
use crate::source::SourceError;

/// Unix seconds of `0001-01-01T00:00:00Z`, the zero instant some clients send
/// instead of omitting the field.
const ZERO_INSTANT_UNIX_SECONDS: i64 = -62_135_596_800;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field event should not be empty")]
    MissingEventName,
    #[error("Field timestamp should not be empty")]
    MissingTimestamp,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event #{position} of the batch is invalid: {source}")]
pub struct BatchValidationError {
    pub position: usize,
    #[source]
    pub source: ValidationError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("missing required attribute `{0}`")]
    Missing(String),
    #[error("attribute `{key}` should be a {expected}, found a {found}")]
    Mismatch {
        key: String,
        expected: AttributeKind,
        found: AttributeKind,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Number,
    Boolean,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::String => write!(f, "string"),
            AttributeKind::Number => write!(f, "number"),
            AttributeKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// A scalar carried in the open-ended `custom_data` payload of an event.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Bool(_) => AttributeKind::Boolean,
            AttributeValue::Number(_) => AttributeKind::Number,
            AttributeValue::String(_) => AttributeKind::String,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_owned())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CustomData {
    pub key: String,
    pub value: AttributeValue,
}

impl CustomData {
    pub fn new(key: &str, value: impl Into<AttributeValue>) -> Self {
        Self {
            key: key.to_owned(),
            value: value.into(),
        }
    }
}

fn null_is_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// An event as received on the wire, before validation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    // null and absent both mean 0
    #[serde(default, deserialize_with = "null_is_default")]
    pub revenue: f64,
    #[serde(
        default,
        deserialize_with = "null_is_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub custom_data: Vec<CustomData>,
}

impl RawEvent {
    #[instrument(skip_all)]
    pub fn from_bytes(bytes: Bytes) -> Result<RawEvent, TimelineError> {
        tracing::debug!(len = bytes.len(), "decoding new event");

        let payload = String::from_utf8(bytes.into()).map_err(|e| {
            tracing::error!("failed to decode body: {}", e);
            TimelineError::RequestDecodingError(String::from("invalid body encoding"))
        })?;

        Ok(serde_json::from_str::<RawEvent>(&payload)?)
    }

    /// Checks the fields every stored or processed event must carry.
    pub fn validate(self) -> Result<Event, ValidationError> {
        if self.event.is_empty() {
            return Err(ValidationError::MissingEventName);
        }

        let timestamp = match self.timestamp {
            Some(ts) if !is_zero_instant(ts) => ts,
            _ => return Err(ValidationError::MissingTimestamp),
        };

        Ok(Event {
            event: self.event,
            timestamp,
            revenue: self.revenue,
            custom_data: self.custom_data,
        })
    }
}

fn is_zero_instant(ts: OffsetDateTime) -> bool {
    ts.unix_timestamp() == ZERO_INSTANT_UNIX_SECONDS && ts.nanosecond() == 0
}

/// A validated event: non-empty name and a real timestamp.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub event: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub revenue: f64,
    pub custom_data: Vec<CustomData>,
}

/// Key to value view over `custom_data`. Later entries overwrite earlier ones
/// sharing a key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeLookup {
    values: HashMap<String, AttributeValue>,
}

impl FromIterator<CustomData> for AttributeLookup {
    fn from_iter<I: IntoIterator<Item = CustomData>>(iter: I) -> Self {
        let mut values = HashMap::new();
        for CustomData { key, value } in iter {
            values.insert(key, value);
        }
        Self { values }
    }
}

impl AttributeLookup {
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    pub fn str(&self, key: &str) -> Result<&str, AttributeError> {
        match self.require(key)? {
            AttributeValue::String(value) => Ok(value),
            other => Err(mismatch(key, AttributeKind::String, other)),
        }
    }

    pub fn number(&self, key: &str) -> Result<f64, AttributeError> {
        match self.require(key)? {
            AttributeValue::Number(value) => Ok(*value),
            other => Err(mismatch(key, AttributeKind::Number, other)),
        }
    }

    fn require(&self, key: &str) -> Result<&AttributeValue, AttributeError> {
        self.get(key)
            .ok_or_else(|| AttributeError::Missing(key.to_owned()))
    }
}

fn mismatch(key: &str, expected: AttributeKind, found: &AttributeValue) -> AttributeError {
    AttributeError::Mismatch {
        key: key.to_owned(),
        expected,
        found: found.kind(),
    }
}

/// The `{"events": [...]}` document served by the batch source.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Events {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

impl Events {
    #[instrument(skip_all)]
    pub fn from_bytes(bytes: Bytes) -> Result<Events, SourceError> {
        tracing::debug!(len = bytes.len(), "decoding event batch");

        let payload = String::from_utf8(bytes.into()).map_err(|e| {
            tracing::error!("failed to decode batch: {}", e);
            SourceError::Decoding(String::from("invalid body encoding"))
        })?;

        Ok(serde_json::from_str::<Events>(&payload)?)
    }

    pub fn validate(self) -> Result<Vec<Event>, BatchValidationError> {
        self.events
            .into_iter()
            .enumerate()
            .map(|(position, raw)| {
                raw.validate()
                    .map_err(|source| BatchValidationError { position, source })
            })
            .collect()
    }
}
