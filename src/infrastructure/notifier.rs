use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::errors::FollowUpError;
use crate::domain::order::Order;
use crate::domain::ports::Notifier;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    mrkdwn: bool,
}

/// Posts messages to a Slack incoming webhook.
#[derive(Clone)]
pub struct SlackNotifier {
    http: Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, FollowUpError> {
        let http = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|err| FollowUpError::Delivery(err.to_string()))?;
        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
        })
    }

    async fn post(&self, text: &str) -> Result<(), FollowUpError> {
        self.http
            .post(&self.webhook_url)
            .json(&WebhookPayload { text, mrkdwn: true })
            .send()
            .await
            .map_err(|err| FollowUpError::Delivery(err.to_string()))?
            .error_for_status()
            .map_err(|err| FollowUpError::Delivery(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn payment_completed(&self, order: &Order, quotation: &Path) -> Result<(), FollowUpError> {
        self.post(&payment_message(order, quotation)).await
    }

    async fn internal_error(&self, message: &str, request_uri: &str) -> Result<(), FollowUpError> {
        self.post(&error_message(message, request_uri)).await
    }
}

/// Stand-in used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn payment_completed(&self, order: &Order, quotation: &Path) -> Result<(), FollowUpError> {
        log::info!(
            "Payment completed for order {} ({} KRW), quotation at {}",
            order.order_number,
            order.total_amount_krw,
            quotation.display()
        );
        Ok(())
    }

    async fn internal_error(&self, message: &str, request_uri: &str) -> Result<(), FollowUpError> {
        log::error!("Internal error on {}: {}", request_uri, message);
        Ok(())
    }
}

/// Groups digits in threes: `51450` becomes `51,450`.
pub fn format_krw(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Shows only the last four characters of a phone number.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() < 4 {
        return phone.to_string();
    }
    let visible = chars.len() - 4;
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

fn payment_message(order: &Order, quotation: &Path) -> String {
    let b = &order.breakdown;
    let a = &order.address;
    let mut text = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(text, ":tada: *Payment completed*\n");
    let _ = writeln!(text, "*Order*\n```");
    let _ = writeln!(text, "Order number: {}", order.order_number);
    let _ = writeln!(text, "Receiver: {}", a.receiver_name);
    let _ = writeln!(text, "Phone: {}", mask_phone(&a.phone));
    let _ = writeln!(text, "Amount: {} KRW", format_krw(order.total_amount_krw));
    if let Some(paid_at) = order.paid_at {
        let _ = writeln!(text, "Paid at: {}", paid_at.format("%Y-%m-%d %H:%M:%S"));
    }
    let _ = writeln!(text, "```\n");

    let _ = writeln!(text, "*Shipping address*\n```");
    let _ = writeln!(text, "{} {}", a.road_address, a.detail_address);
    let _ = writeln!(text, "Postal code: {}", a.postal_code);
    if let Some(request) = a.delivery_request.as_deref().filter(|r| !r.trim().is_empty()) {
        let _ = writeln!(text, "Delivery request: {request}");
    }
    let _ = writeln!(text, "```\n");

    let _ = writeln!(text, "*Items*");
    for (i, item) in order.items.iter().enumerate() {
        let _ = writeln!(
            text,
            "{}. {} - {} KRW",
            i + 1,
            item.product_name,
            format_krw(item.price_krw)
        );
    }
    let _ = writeln!(text);

    let _ = writeln!(text, "*Costs*\n```");
    let _ = writeln!(text, "Products: {} KRW", format_krw(b.product_total_krw));
    let _ = writeln!(text, "Shipping: {} KRW", format_krw(b.total_shipping_krw));
    let _ = writeln!(text, "Service fee: {} KRW", format_krw(b.service_fee_krw));
    let _ = writeln!(text, "Payment fee: {} KRW", format_krw(b.payment_fee_krw));
    if b.extra_packaging_fee_krw > 0 {
        let _ = writeln!(text, "Extra packaging: {} KRW", format_krw(b.extra_packaging_fee_krw));
    }
    if b.insurance_fee_krw > 0 {
        let _ = writeln!(text, "Insurance: {} KRW", format_krw(b.insurance_fee_krw));
    }
    let _ = writeln!(text, "Grand total: {} KRW", format_krw(b.grand_total_krw));
    let _ = writeln!(text, "```\n");

    let _ = write!(text, ":page_facing_up: Quotation: `{}`", quotation.display());
    text
}

fn error_message(message: &str, request_uri: &str) -> String {
    format!(":rotating_light: *Internal server error*\n*URI:* `{request_uri}`\n```\n{message}\n```")
}
