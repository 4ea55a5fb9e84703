use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::errors::FollowUpError;
use crate::domain::order::Order;
use crate::domain::ports::{Notifier, QuotationWriter};

/// Best-effort work that runs once an order is paid: render the quotation,
/// then tell the operators. Failures never reach the customer.
#[derive(Clone)]
pub struct OrderFollowUp {
    writer: Arc<dyn QuotationWriter>,
    notifier: Arc<dyn Notifier>,
}

impl OrderFollowUp {
    pub fn new(writer: Arc<dyn QuotationWriter>, notifier: Arc<dyn Notifier>) -> Self {
        Self { writer, notifier }
    }

    pub async fn order_paid(&self, order: Order) -> Result<PathBuf, FollowUpError> {
        let writer = Arc::clone(&self.writer);
        let snapshot = order.clone();
        let path = tokio::task::spawn_blocking(move || writer.write(&snapshot))
            .await
            .map_err(|err| FollowUpError::Artifact(err.to_string()))??;
        log::info!(
            "Quotation for order {} written to {}",
            order.order_number,
            path.display()
        );

        self.notifier.payment_completed(&order, &path).await?;
        Ok(path)
    }

    /// Runs [`Self::order_paid`] in the background, logging any failure.
    pub fn spawn_order_paid(&self, order: Order) {
        let this = self.clone();
        tokio::spawn(async move {
            let order_number = order.order_number.clone();
            if let Err(err) = this.order_paid(order).await {
                log::error!("Follow-up for order {} failed: {}", order_number, err);
            }
        });
    }

    pub async fn internal_error(&self, message: &str, request_uri: &str) {
        if let Err(err) = self.notifier.internal_error(message, request_uri).await {
            log::error!("Could not forward internal error alert: {}", err);
        }
    }

    pub fn spawn_internal_error(&self, message: String, request_uri: String) {
        let this = self.clone();
        tokio::spawn(async move {
            this.internal_error(&message, &request_uri).await;
        });
    }
}
