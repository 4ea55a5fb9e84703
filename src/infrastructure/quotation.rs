use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::address::AddressDetails;
use crate::domain::errors::FollowUpError;
use crate::domain::estimate::CostBreakdown;
use crate::domain::order::Order;
use crate::domain::ports::QuotationWriter;

#[derive(Debug, Serialize)]
struct QuotationLine<'a> {
    position: usize,
    product_name: &'a str,
    price_krw: i64,
    quantity: i32,
}

#[derive(Debug, Serialize)]
struct QuotationDocument<'a> {
    order_number: &'a str,
    status: &'static str,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    customs_code: Option<&'a str>,
    address: &'a AddressDetails,
    items: Vec<QuotationLine<'a>>,
    costs: &'a CostBreakdown,
    total_amount_krw: i64,
}

impl<'a> From<&'a Order> for QuotationDocument<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            order_number: &order.order_number,
            status: order.status.as_str(),
            created_at: order.created_at,
            paid_at: order.paid_at,
            customs_code: order.customs_code.as_deref(),
            address: &order.address,
            items: order
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| QuotationLine {
                    position: i + 1,
                    product_name: &item.product_name,
                    price_krw: item.price_krw,
                    quantity: item.quantity,
                })
                .collect(),
            costs: &order.breakdown,
            total_amount_krw: order.total_amount_krw,
        }
    }
}

/// Writes `<dir>/<order_number>.json`.
#[derive(Debug, Clone)]
pub struct JsonQuotationWriter {
    dir: PathBuf,
}

impl JsonQuotationWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl QuotationWriter for JsonQuotationWriter {
    fn write(&self, order: &Order) -> Result<PathBuf, FollowUpError> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            FollowUpError::Artifact(format!("{}: {err}", self.dir.display()))
        })?;

        let path = self.dir.join(format!("{}.json", order.order_number));
        let body = serde_json::to_vec_pretty(&QuotationDocument::from(order))
            .map_err(|err| FollowUpError::Artifact(err.to_string()))?;
        fs::write(&path, body)
            .map_err(|err| FollowUpError::Artifact(format!("{}: {err}", path.display())))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::estimate::tests::{item, stub_calculator};
    use crate::domain::estimate::EstimateOptions;
    use crate::domain::order::{OrderItem, OrderStatus};

    fn order() -> Order {
        let breakdown = stub_calculator()
            .estimate(&[item(Some(12000), None, None)], EstimateOptions::default())
            .unwrap();
        Order {
            id: Uuid::new_v4(),
            order_number: "20251024093015".to_string(),
            session_id: "sid-1".to_string(),
            total_amount_krw: breakdown.grand_total_krw,
            status: OrderStatus::Paid,
            customs_code: Some("P123".to_string()),
            address: AddressDetails {
                receiver_name: "Kim Minji".to_string(),
                phone: "010-1234-5678".to_string(),
                postal_code: "04524".to_string(),
                road_address: "110 Sejong-daero".to_string(),
                detail_address: "3F".to_string(),
                delivery_request: None,
            },
            breakdown,
            items: vec![OrderItem {
                product_name: "Tea set".to_string(),
                price_krw: 12000,
                quantity: 1,
                image_url: None,
            }],
            created_at: Utc::now(),
            paid_at: Some(Utc::now()),
        }
    }

    #[test]
    fn writes_one_document_per_order_number() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonQuotationWriter::new(dir.path().join("nested"));
        let order = order();

        let path = writer.write(&order).unwrap();

        assert_eq!(path, dir.path().join("nested").join("20251024093015.json"));
        let doc: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(doc["order_number"], "20251024093015");
        assert_eq!(doc["status"], "PAID");
        assert_eq!(doc["items"][0]["position"], 1);
        assert_eq!(doc["items"][0]["product_name"], "Tea set");
        assert_eq!(doc["costs"]["grand_total_krw"], order.breakdown.grand_total_krw);
        assert_eq!(doc["address"]["receiver_name"], "Kim Minji");
    }

    #[test]
    fn unwritable_directory_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let writer = JsonQuotationWriter::new(blocker.join("sub"));
        let result = writer.write(&order());
        assert!(matches!(result, Err(FollowUpError::Artifact(_))));
    }
}
