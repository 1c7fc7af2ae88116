use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::models::{
    Coupon, CouponSnapshot, CustomerInfo, NewOrder, OrderItemSnapshot, OrderStatus,
    OrderWithItems, PaymentInfo,
};
use crate::payments::PaymentMethod;
use crate::pricing::{self, CheckoutLine};
use crate::util::generate_order_id;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: CustomerInfo,
    pub payment_method: String,
    /// Customer-quoted transaction id; required for manual methods.
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

impl CreateOrderRequest {
    fn validate(&self) -> Result<PaymentMethod> {
        if self.customer.name.trim().is_empty() {
            return Err(AppError::Validation("Customer name is required".into()));
        }
        if self.customer.phone.trim().is_empty() {
            return Err(AppError::Validation("Customer phone is required".into()));
        }
        if self.customer.email.trim().is_empty() {
            return Err(AppError::Validation("Customer email is required".into()));
        }

        let method = PaymentMethod::from_str(&self.payment_method)
            .ok_or_else(|| AppError::Validation("Please select a payment method".into()))?;

        if method == PaymentMethod::RupantorPay {
            return Err(AppError::Validation(
                "Gateway payments go through the payment checkout, not direct order creation"
                    .into(),
            ));
        }

        let has_transaction_id = self
            .transaction_id
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if method.requires_transaction_id() && !has_transaction_id {
            return Err(AppError::Validation(
                "Please enter the transaction ID".into(),
            ));
        }

        Ok(method)
    }
}

/// Look up and vet a coupon for this cart. `None` code means no coupon.
pub fn resolve_coupon(
    conn: &rusqlite::Connection,
    code: Option<&str>,
    lines: &[pricing::ResolvedLine],
) -> Result<Option<Coupon>> {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    let coupon = queries::get_coupon_by_code(conn, code)?.ok_or_else(|| {
        AppError::Validation("The coupon code is invalid or has expired".into())
    })?;
    pricing::check_coupon(&coupon, lines)?;
    Ok(Some(coupon))
}

/// Create a manual-payment order. Totals come from the pricing engine,
/// never from the client; the order is persisted with status Pending.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    let method = request.validate()?;

    let mut conn = state.db.get()?;

    let lines = pricing::resolve_lines(&conn, &request.items)?;
    let coupon = resolve_coupon(&conn, request.coupon_code.as_deref(), &lines)?;
    let totals = pricing::compute_totals(&lines, coupon.as_ref());

    let order = NewOrder {
        order_id: generate_order_id(),
        customer: request.customer.clone(),
        payment: PaymentInfo {
            method: method.as_str().to_string(),
            transaction_id: request.transaction_id.clone(),
        },
        totals,
        status: OrderStatus::Pending,
        coupon: coupon.map(|c| CouponSnapshot {
            code: c.code,
            discount_percentage: c.discount_percentage,
        }),
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
    };

    let created = queries::create_order(&mut conn, &order).map_err(|e| match e {
        AppError::Conflict(_) => {
            AppError::Conflict("An order with this transaction ID already exists".into())
        }
        other => other,
    })?;

    tracing::info!(order_id = %created.order.order_id, total = created.order.totals.total, "order created");

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct OrderHistoryQuery {
    /// JSON-encoded id list (the client persists its own order index);
    /// a bare comma-separated list is also accepted.
    pub ids: Option<String>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderHistoryQuery>,
) -> Result<Json<Vec<OrderWithItems>>> {
    let raw = query
        .ids
        .ok_or_else(|| AppError::Validation("ids parameter is required".into()))?;

    let ids: Vec<String> = serde_json::from_str(&raw).unwrap_or_else(|_| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    });

    let conn = state.db.get()?;
    let orders = queries::list_orders_by_order_ids(&conn, &ids)?;
    Ok(Json(orders))
}
