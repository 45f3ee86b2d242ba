//! Purchase timeline pipeline.
//!
//! A batch of validated events goes through four pure steps:
//!   - classify: split `comprou` transactions from line items,
//!   - group: collect line-item products per transaction id,
//!   - assemble: join each transaction with its products,
//!   - sort: most recent transaction first.
//!
//! Each call owns its batch and every intermediate value. Nothing is shared
//! across calls, so the pipeline can run for concurrent requests as is.

mod classify;
mod products;
mod timeline;

use thiserror::Error;
use tracing::instrument;

use crate::event::{AttributeError, Event};

pub use classify::{classify, Classified, IndexedEvent};
pub use products::{group_products, Product, ProductGroup};
pub use timeline::{assemble_timeline, sort_timeline, Timeline, TimelineEntry};

pub const TRANSACTION_EVENT: &str = "comprou";
pub const LINE_ITEM_EVENT: &str = "comprou-produto";

pub const TRANSACTION_ID: &str = "transaction_id";
pub const STORE_NAME: &str = "store_name";
pub const PRODUCT_NAME: &str = "product_name";
pub const PRODUCT_PRICE: &str = "product_price";

/// A required attribute is absent or carries the wrong scalar kind. Aborts the
/// whole batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event #{position} ({event}) has an invalid shape: {source}")]
pub struct ShapeError {
    /// Zero-based position of the event in the input batch.
    pub position: usize,
    pub event: String,
    #[source]
    pub source: AttributeError,
}

#[instrument(skip_all, fields(batch_size = batch.len()))]
pub fn build_timeline(batch: Vec<Event>) -> Result<Timeline, ShapeError> {
    let Classified {
        transactions,
        line_items,
    } = classify(batch);

    let products = group_products(&line_items)?;
    let timeline = assemble_timeline(&transactions, &products)?;

    tracing::debug!(
        transactions = transactions.len(),
        line_items = line_items.len(),
        "built timeline"
    );

    Ok(sort_timeline(timeline))
}
