use time::OffsetDateTime;

use super::{ShapeError, LINE_ITEM_EVENT, TRANSACTION_EVENT};
use crate::event::{AttributeError, AttributeLookup, Event};

/// An event with its attribute lookup built, remembering where it sat in the batch.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedEvent {
    pub position: usize,
    pub event: String,
    pub timestamp: OffsetDateTime,
    pub revenue: f64,
    pub attributes: AttributeLookup,
}

impl IndexedEvent {
    pub fn str(&self, key: &str) -> Result<&str, ShapeError> {
        self.attributes.str(key).map_err(|source| self.shape_error(source))
    }

    pub fn number(&self, key: &str) -> Result<f64, ShapeError> {
        self.attributes
            .number(key)
            .map_err(|source| self.shape_error(source))
    }

    fn shape_error(&self, source: AttributeError) -> ShapeError {
        ShapeError {
            position: self.position,
            event: self.event.clone(),
            source,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Classified {
    pub transactions: Vec<IndexedEvent>,
    pub line_items: Vec<IndexedEvent>,
}

/// Partitions the batch in a single pass, preserving order. Anything that is
/// not a transaction is a line item.
pub fn classify(batch: Vec<Event>) -> Classified {
    let mut classified = Classified::default();

    for (position, event) in batch.into_iter().enumerate() {
        let indexed = IndexedEvent {
            position,
            timestamp: event.timestamp,
            revenue: event.revenue,
            attributes: event.custom_data.into_iter().collect(),
            event: event.event,
        };

        if indexed.event == TRANSACTION_EVENT {
            classified.transactions.push(indexed);
        } else {
            if indexed.event != LINE_ITEM_EVENT {
                tracing::warn!(
                    position,
                    event_type = %indexed.event,
                    "unrecognized event type, handling it as a line item"
                );
            }
            classified.line_items.push(indexed);
        }
    }

    classified
}
