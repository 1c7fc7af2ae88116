use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{
    CouponSnapshot, CustomerInfo, NewOrder, OrderItemSnapshot, OrderStatus, OrderTotals,
    PaymentInfo,
};
use crate::payments::{CreatePaymentRequest, PaymentMethod, VerifyResponse, format_amount};
use crate::pricing::{self, CheckoutLine};
use crate::util::generate_order_id;

use super::orders::resolve_coupon;

/// Checkout snapshot carried through the gateway's metadata field and
/// echoed back by the verify endpoint. The webhook rebuilds the order
/// from this after re-verification.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub items: Vec<OrderItemSnapshot>,
    #[serde(default)]
    pub totals: Option<OrderTotals>,
    #[serde(default)]
    pub coupon: Option<CouponSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGatewayPaymentRequest {
    pub customer: CustomerInfo,
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateGatewayPaymentResponse {
    pub payment_url: String,
    pub order_id: String,
    pub amount: String,
}

/// Initiate a hosted gateway checkout.
///
/// The amount is computed server-side by the pricing engine; redirect and
/// webhook URLs come from the configured external base URL.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreateGatewayPaymentRequest>,
) -> Result<Json<CreateGatewayPaymentResponse>> {
    if request.customer.name.trim().is_empty() {
        return Err(AppError::Validation("Customer name is required".into()));
    }
    if request.customer.email.trim().is_empty() {
        return Err(AppError::Validation("Customer email is required".into()));
    }

    let conn = state.db.get()?;
    let lines = pricing::resolve_lines(&conn, &request.items)?;
    let coupon = resolve_coupon(&conn, request.coupon_code.as_deref(), &lines)?;
    let totals = pricing::compute_totals(&lines, coupon.as_ref());
    drop(conn);

    let order_id = generate_order_id();
    let metadata = CheckoutMetadata {
        order_id: Some(order_id.clone()),
        customer: Some(request.customer.clone()),
        items: lines
            .iter()
            .map(|l| OrderItemSnapshot {
                product_id: l.product_id.clone(),
                name: l.product_name.clone(),
                quantity: l.quantity,
                duration: l.duration.clone(),
                unit_price: l.unit_price,
            })
            .collect(),
        totals: Some(totals),
        coupon: coupon.map(|c| CouponSnapshot {
            code: c.code,
            discount_percentage: c.discount_percentage,
        }),
    };

    let amount = format_amount(totals.total);
    let payment_url = state
        .gateway
        .create_payment(&CreatePaymentRequest {
            fullname: request.customer.name.clone(),
            email: request.customer.email.clone(),
            amount: amount.clone(),
            success_url: format!("{}/payment-success", state.base_url),
            cancel_url: format!("{}/payment-cancelled", state.base_url),
            webhook_url: format!("{}/api/rupantorpay/webhook", state.base_url),
            metadata: serde_json::to_value(&metadata)?,
        })
        .await?;

    tracing::info!(%order_id, %amount, "gateway checkout created");

    Ok(Json(CreateGatewayPaymentResponse {
        payment_url,
        order_id,
        amount,
    }))
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Capital ID in the provider's webhook parameters.
    #[serde(rename = "transactionID", alias = "transaction_id")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Gateway delivery of payment completion.
///
/// The payload is a trigger only: nothing in it is trusted until the
/// transaction has been re-verified with the provider. Duplicate
/// deliveries for one transaction id resolve to the already-created
/// order.
pub async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> (StatusCode, &'static str) {
    let Some(transaction_id) = payload
        .transaction_id
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    else {
        return (StatusCode::BAD_REQUEST, "Missing transaction ID");
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Database error");
        }
    };

    // Fast-path dedupe; the UNIQUE constraint below is authoritative.
    match queries::get_order_by_transaction_id(&conn, transaction_id) {
        Ok(Some(order)) => {
            tracing::info!(order_id = %order.order_id, %transaction_id, "webhook replay ignored");
            return (StatusCode::OK, "Already processed");
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("DB error: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Database error");
        }
    }
    drop(conn);

    let verification = match state.gateway.verify_payment(transaction_id).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(%transaction_id, "webhook verification failed: {}", e);
            return (StatusCode::BAD_GATEWAY, "Verification failed");
        }
    };

    if !verification.is_successful() {
        tracing::info!(%transaction_id, status = %verification.status, "webhook for incomplete payment");
        return (StatusCode::OK, "Payment not completed");
    }

    let order = order_from_verification(&verification, transaction_id);

    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Database error");
        }
    };

    match queries::create_order(&mut conn, &order) {
        Ok(created) => {
            tracing::info!(order_id = %created.order.order_id, %transaction_id, "order created from webhook");
            (StatusCode::OK, "OK")
        }
        // Lost the race against a concurrent delivery; the order exists.
        Err(AppError::Conflict(_)) => (StatusCode::OK, "Already processed"),
        Err(e) => {
            tracing::error!("Failed to create order: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create order")
        }
    }
}

/// Build the order record from a verified COMPLETED transaction.
///
/// The checkout snapshot normally rides in the metadata; when the
/// provider drops it, the order is still recorded from the verified
/// customer fields so the payment is never lost.
pub fn order_from_verification(verification: &VerifyResponse, transaction_id: &str) -> NewOrder {
    let metadata: CheckoutMetadata =
        serde_json::from_value(verification.metadata.clone()).unwrap_or_default();

    let customer = metadata.customer.unwrap_or_else(|| CustomerInfo {
        name: verification.fullname.clone(),
        phone: String::new(),
        email: verification.email.clone(),
        address: None,
    });

    let totals = metadata.totals.unwrap_or_else(|| {
        let amount = verification.amount.parse::<f64>().unwrap_or(0.0);
        OrderTotals {
            subtotal: amount,
            discount: 0.0,
            total: amount,
        }
    });

    let method = if verification.payment_method.is_empty() {
        PaymentMethod::RupantorPay.as_str().to_string()
    } else {
        verification.payment_method.clone()
    };

    NewOrder {
        order_id: metadata.order_id.unwrap_or_else(generate_order_id),
        customer,
        payment: PaymentInfo {
            method,
            transaction_id: Some(transaction_id.to_string()),
        },
        totals,
        status: OrderStatus::Confirmed,
        coupon: metadata.coupon,
        items: metadata.items,
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub transaction_id: String,
}

/// Explicit transaction verification passthrough.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    if request.transaction_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Missing required field: transaction_id".into(),
        ));
    }

    let verification = state.gateway.verify_payment(&request.transaction_id).await?;
    Ok(Json(verification))
}
