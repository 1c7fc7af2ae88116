use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    /// Orders may be deleted only once they have left the Pending state.
    pub fn is_deletable(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Cancelled)
    }
}

/// Customer contact details embedded in the order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Totals computed by the pricing engine at order-creation time and
/// frozen into the record; never recomputed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

/// Snapshot of the coupon as applied, so the order stays explainable
/// after the live coupon is edited or deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponSnapshot {
    pub code: String,
    pub discount_percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Business-visible identifier, globally unique.
    pub order_id: String,
    pub customer: CustomerInfo,
    pub payment: PaymentInfo,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub coupon: Option<CouponSnapshot>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Line item with the product name and chosen tier copied at transaction
/// time. `product_id` is a soft reference; later edits or deletion of the
/// product must not affect this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub duration: String,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Item snapshot handed to the order insert, already resolved against
/// the catalog. Also round-trips through gateway checkout metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub duration: String,
    pub unit_price: i64,
}

/// Fully-validated order ready for persistence.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub customer: CustomerInfo,
    pub payment: PaymentInfo,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub coupon: Option<CouponSnapshot>,
    pub items: Vec<OrderItemSnapshot>,
}
