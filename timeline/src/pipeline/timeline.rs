use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{IndexedEvent, Product, ProductGroup, ShapeError, STORE_NAME, TRANSACTION_ID};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TimelineEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub revenue: f64,
    pub transaction_id: String,
    pub store_name: String,
    pub products: Vec<Product>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Timeline {
    pub timeline: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }
}

/// One entry per transaction, in input order.
pub fn assemble_timeline(
    transactions: &[IndexedEvent],
    products: &ProductGroup,
) -> Result<Timeline, ShapeError> {
    let timeline = transactions
        .iter()
        .map(|transaction| {
            let transaction_id = transaction.str(TRANSACTION_ID)?;
            Ok(TimelineEntry {
                timestamp: transaction.timestamp,
                revenue: transaction.revenue,
                transaction_id: transaction_id.to_owned(),
                store_name: transaction.str(STORE_NAME)?.to_owned(),
                products: products.products(transaction_id).to_vec(),
            })
        })
        .collect::<Result<Vec<TimelineEntry>, ShapeError>>()?;

    Ok(Timeline { timeline })
}

/// Most recent first. Entries sharing a timestamp keep their relative order.
pub fn sort_timeline(mut timeline: Timeline) -> Timeline {
    timeline
        .timeline
        .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    timeline
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::event::{AttributeError, CustomData};

    fn transaction(position: usize, data: Vec<CustomData>) -> IndexedEvent {
        IndexedEvent {
            position,
            event: "comprou".to_string(),
            timestamp: datetime!(2016-09-22 13:57:31 -3),
            revenue: 100.0,
            attributes: data.into_iter().collect(),
        }
    }

    fn entry(id: &str, timestamp: OffsetDateTime) -> TimelineEntry {
        TimelineEntry {
            timestamp,
            revenue: 0.0,
            transaction_id: id.to_string(),
            store_name: "Patio Savassi".to_string(),
            products: vec![],
        }
    }

    #[test]
    fn joins_transaction_with_its_products() {
        let mut products = ProductGroup::default();
        products.push(
            "3029384",
            Product {
                name: "Camisa Azul".to_string(),
                price: 100.0,
            },
        );

        let timeline = assemble_timeline(
            &[transaction(
                0,
                vec![
                    CustomData::new(STORE_NAME, "Patio Savassi"),
                    CustomData::new(TRANSACTION_ID, "3029384"),
                ],
            )],
            &products,
        )
        .unwrap();

        assert_eq!(timeline.len(), 1);
        let entry = &timeline.timeline[0];
        assert_eq!(entry.transaction_id, "3029384");
        assert_eq!(entry.store_name, "Patio Savassi");
        assert_eq!(entry.revenue, 100.0);
        assert_eq!(entry.products.len(), 1);
    }

    #[test]
    fn transaction_without_products_gets_an_empty_list() {
        let timeline = assemble_timeline(
            &[transaction(
                0,
                vec![
                    CustomData::new(STORE_NAME, "Patio Savassi"),
                    CustomData::new(TRANSACTION_ID, "404"),
                ],
            )],
            &ProductGroup::default(),
        )
        .unwrap();

        assert!(timeline.timeline[0].products.is_empty());
    }

    #[test]
    fn transaction_without_store_name_is_a_shape_error() {
        let result = assemble_timeline(
            &[transaction(
                2,
                vec![CustomData::new(TRANSACTION_ID, "3029384")],
            )],
            &ProductGroup::default(),
        );

        assert_eq!(
            result,
            Err(ShapeError {
                position: 2,
                event: "comprou".to_string(),
                source: AttributeError::Missing(STORE_NAME.to_string()),
            })
        );
    }

    #[test]
    fn sorts_by_timestamp_descending() {
        let timeline = sort_timeline(Timeline {
            timeline: vec![
                entry("a", datetime!(2016-09-22 13:57:31 -3)),
                entry("b", datetime!(2016-10-02 11:33:41 -3)),
                entry("c", datetime!(2016-09-30 09:00:00 UTC)),
            ],
        });

        let ids: Vec<&str> = timeline
            .timeline
            .iter()
            .map(|e| e.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(timeline
            .timeline
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let same = datetime!(2016-09-22 13:57:31 -3);
        // Same instant, different offset.
        let same_elsewhere = datetime!(2016-09-22 16:57:31 UTC);
        let timeline = sort_timeline(Timeline {
            timeline: vec![
                entry("first", same),
                entry("older", datetime!(2016-09-01 00:00:00 UTC)),
                entry("second", same_elsewhere),
                entry("third", same),
            ],
        });

        let ids: Vec<&str> = timeline
            .timeline
            .iter()
            .map(|e| e.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second", "third", "older"]);
    }

    #[test]
    fn sorting_empty_timeline_is_a_no_op() {
        assert!(sort_timeline(Timeline::default()).is_empty());
    }

    #[test]
    fn serializes_to_the_response_shape_and_back() {
        let timeline = Timeline {
            timeline: vec![TimelineEntry {
                timestamp: datetime!(2016-09-22 13:57:31.2311892 -3),
                revenue: 250.0,
                transaction_id: "3029384".to_string(),
                store_name: "Patio Savassi".to_string(),
                products: vec![Product {
                    name: "Camisa Azul".to_string(),
                    price: 100.0,
                }],
            }],
        };

        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(
            json["timeline"][0]["timestamp"],
            "2016-09-22T13:57:31.2311892-03:00"
        );
        assert_eq!(json["timeline"][0]["products"][0]["name"], "Camisa Azul");

        let parsed: Timeline = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, timeline);
    }
}
