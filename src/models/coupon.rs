use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result};

/// Which subset of cart line items a coupon's discount applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CouponScope {
    AllProducts,
    /// Restricted to one category; `scope_value` holds the category slug.
    Category,
    /// Restricted to one product; `scope_value` holds the product id.
    SingleProduct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    /// Stored upper-case; lookups normalize before matching.
    pub code: String,
    pub discount_percentage: u32,
    pub scope: CouponScope,
    pub scope_value: Option<String>,
    pub active: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCoupon {
    pub code: String,
    pub discount_percentage: u32,
    pub scope: CouponScope,
    #[serde(default)]
    pub scope_value: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CreateCoupon {
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(AppError::Validation("Coupon code is required".into()));
        }
        if self.discount_percentage > 100 {
            return Err(AppError::Validation(
                "Discount percentage must be between 0 and 100".into(),
            ));
        }
        // Scoped coupons need something to scope to.
        if !matches!(self.scope, CouponScope::AllProducts) && self.scope_value.is_none() {
            return Err(AppError::Validation(
                "Scoped coupons require a scope value".into(),
            ));
        }
        Ok(())
    }
}
