//! Customer email delivery via the Resend API.
//!
//! Two modes: send via Resend when an API key is configured, otherwise
//! log-only (the admin console still reports what would have been sent).

use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::OrderItem;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Result of attempting to send a product-access email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailSendResult {
    Sent,
    /// No API key configured; the email was logged, not delivered.
    NoApiKey,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_key: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
        }
    }

    /// Send the product-access email for an order: the purchased items
    /// plus optional admin-supplied access instructions.
    pub async fn send_product_access(
        &self,
        to_email: &str,
        customer_name: &str,
        order_id: &str,
        items: &[OrderItem],
        instructions: Option<&str>,
    ) -> Result<EmailSendResult> {
        let subject = format!("Your SubMonth order {} is ready", order_id);
        let html = render_product_access(customer_name, order_id, items, instructions);

        let Some(api_key) = &self.api_key else {
            tracing::info!(%to_email, %order_id, "email delivery disabled, skipping send");
            return Ok(EmailSendResult::NoApiKey);
        };

        let request = ResendRequest {
            from: &self.from,
            to: vec![to_email],
            subject,
            html,
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Resend API error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Resend returned {}: {}",
                status, body
            )));
        }

        tracing::info!(%to_email, %order_id, "product access email sent");
        Ok(EmailSendResult::Sent)
    }
}

fn render_product_access(
    customer_name: &str,
    order_id: &str,
    items: &[OrderItem],
    instructions: Option<&str>,
) -> String {
    let mut rows = String::new();
    for item in items {
        rows.push_str(&format!(
            "<li>{} — {} × {}</li>",
            item.name, item.duration, item.quantity
        ));
    }

    let instructions_block = instructions
        .map(|text| format!("<p>{}</p>", text))
        .unwrap_or_default();

    format!(
        "<p>Hi {},</p>\
         <p>Your order <strong>{}</strong> is confirmed. You purchased:</p>\
         <ul>{}</ul>\
         {}\
         <p>Reply to this email if anything is missing.</p>\
         <p>— SubMonth</p>",
        customer_name, order_id, rows, instructions_block
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, duration: &str, quantity: i64) -> OrderItem {
        OrderItem {
            id: "i1".to_string(),
            order_id: "o1".to_string(),
            product_id: "p1".to_string(),
            name: name.to_string(),
            quantity,
            duration: duration.to_string(),
            unit_price: 450,
        }
    }

    #[test]
    fn body_lists_every_item() {
        let items = vec![item("Grammarly Premium", "1 Month", 1), item("Canva Pro", "1 Year", 2)];
        let html = render_product_access("Rahim", "ORD-1", &items, Some("Login: x"));

        assert!(html.contains("Grammarly Premium"));
        assert!(html.contains("Canva Pro"));
        assert!(html.contains("Login: x"));
        assert!(html.contains("ORD-1"));
    }

    #[tokio::test]
    async fn missing_api_key_is_not_an_error() {
        let mailer = Mailer::new(None, "support@submonth.com".to_string());
        let result = mailer
            .send_product_access("a@b.com", "Rahim", "ORD-1", &[], None)
            .await
            .unwrap();
        assert_eq!(result, EmailSendResult::NoApiKey);
    }
}
