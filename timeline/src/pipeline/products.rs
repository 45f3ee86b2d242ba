use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{IndexedEvent, ShapeError, PRODUCT_NAME, PRODUCT_PRICE, TRANSACTION_ID};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Product {
    pub name: String,
    pub price: f64,
}

/// Products bought in each transaction, in the order their line items arrived.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductGroup {
    groups: HashMap<String, Vec<Product>>,
}

impl ProductGroup {
    pub fn push(&mut self, transaction_id: &str, product: Product) {
        self.groups
            .entry(transaction_id.to_owned())
            .or_default()
            .push(product);
    }

    /// Products for a transaction. Unknown ids have no products.
    pub fn products(&self, transaction_id: &str) -> &[Product] {
        self.groups
            .get(transaction_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

pub fn group_products(line_items: &[IndexedEvent]) -> Result<ProductGroup, ShapeError> {
    let mut group = ProductGroup::default();

    for item in line_items {
        let product = Product {
            name: item.str(PRODUCT_NAME)?.to_owned(),
            price: item.number(PRODUCT_PRICE)?,
        };
        group.push(item.str(TRANSACTION_ID)?, product);
    }

    Ok(group)
}
