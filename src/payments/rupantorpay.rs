use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct CreatePaymentRequest {
    pub fullname: String,
    pub email: String,
    /// Pre-formatted via [`format_amount`].
    pub amount: String,
    pub success_url: String,
    pub cancel_url: String,
    pub webhook_url: String,
    /// Checkout snapshot echoed back by the verify endpoint.
    pub metadata: Value,
}

/// Canonical transaction record from the provider's verify endpoint.
/// Fields other than `status` are lenient: the provider omits some on
/// error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// "COMPLETED", "PENDING", or "ERROR".
    pub status: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub trx_id: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub metadata: Value,
}

impl VerifyResponse {
    /// Payment success is strictly COMPLETED; PENDING/ERROR/anything
    /// else is not-yet-successful.
    pub fn is_successful(&self) -> bool {
        self.status == "COMPLETED"
    }
}

#[derive(Debug, Clone)]
pub struct RupantorPayClient {
    client: Client,
    api_key: String,
    base_url: String,
    /// Sent as X-CLIENT; the serving host, derived from our external
    /// base URL.
    client_host: String,
}

impl RupantorPayClient {
    pub fn new(api_key: &str, base_url: &str, own_base_url: &str) -> Self {
        let client_host = own_base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .next()
            .unwrap_or("localhost")
            .to_string();

        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_host,
        }
    }

    /// POST a JSON body, retrying once on transient network failure.
    /// Never fabricates a response: anything short of a parsed provider
    /// reply surfaces as `Upstream`.
    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = self
                .client
                .post(&url)
                .header("X-API-KEY", &self.api_key)
                .header("X-CLIENT", &self.client_host)
                .json(body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) if attempt == 1 && (e.is_timeout() || e.is_connect()) => {
                    tracing::warn!(%url, error = %e, "gateway request failed, retrying once");
                    continue;
                }
                Err(e) => {
                    return Err(AppError::Upstream(format!("RupantorPay request failed: {}", e)));
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body_text = response.text().await.unwrap_or_default();
                return Err(AppError::Upstream(format!(
                    "RupantorPay returned {}: {}",
                    status, body_text
                )));
            }

            return response
                .json()
                .await
                .map_err(|e| AppError::Upstream(format!("invalid RupantorPay response: {}", e)));
        }
    }

    /// Error replies carry `status: false` with a message, at any HTTP
    /// status.
    fn reject_provider_error(value: &Value) -> Result<()> {
        if value.get("status") == Some(&Value::Bool(false)) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("request rejected");
            return Err(AppError::Upstream(format!("RupantorPay: {}", message)));
        }
        Ok(())
    }

    /// Create a hosted checkout; returns the URL the customer's browser
    /// is redirected to.
    pub async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<String> {
        let value = self.post_json("checkout", request).await?;
        Self::reject_provider_error(&value)?;

        value
            .get("payment_url")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                AppError::Upstream("RupantorPay response had no payment_url".into())
            })
    }

    /// Fetch the provider's canonical record for a transaction.
    pub async fn verify_payment(&self, transaction_id: &str) -> Result<VerifyResponse> {
        let value = self
            .post_json(
                "verify-payment",
                &serde_json::json!({ "transaction_id": transaction_id }),
            )
            .await?;
        Self::reject_provider_error(&value)?;

        serde_json::from_value(value)
            .map_err(|e| AppError::Upstream(format!("invalid verification record: {}", e)))
    }
}

/// Format an amount per the provider's numeric convention: whole numbers
/// unadorned, fractional amounts with minimal decimal digits.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        (amount as i64).to_string()
    } else {
        amount.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_amounts_have_no_decimals() {
        assert_eq!(format_amount(450.0), "450");
        assert_eq!(format_amount(4005.0), "4005");
        assert_eq!(format_amount(1.0), "1");
    }

    #[test]
    fn fractional_amounts_keep_minimal_digits() {
        assert_eq!(format_amount(382.5), "382.5");
        assert_eq!(format_amount(67.25), "67.25");
    }

    #[test]
    fn only_completed_counts_as_successful() {
        let mut response = VerifyResponse {
            status: "COMPLETED".to_string(),
            fullname: String::new(),
            email: String::new(),
            amount: String::new(),
            transaction_id: String::new(),
            trx_id: String::new(),
            currency: String::new(),
            payment_method: String::new(),
            metadata: Value::Null,
        };
        assert!(response.is_successful());

        for status in ["PENDING", "ERROR", "completed", ""] {
            response.status = status.to_string();
            assert!(!response.is_successful(), "{:?} must not be successful", status);
        }
    }

    #[test]
    fn client_host_is_derived_from_base_url() {
        let client = RupantorPayClient::new("key", "https://pay.example.com/api", "https://shop.example.com/store");
        assert_eq!(client.client_host, "shop.example.com");
    }

    #[test]
    fn provider_error_body_is_rejected() {
        let value = serde_json::json!({ "status": false, "message": "Invalid API key" });
        assert!(RupantorPayClient::reject_provider_error(&value).is_err());

        let ok = serde_json::json!({ "status": 1, "payment_url": "https://x" });
        assert!(RupantorPayClient::reject_provider_error(&ok).is_ok());
    }
}
