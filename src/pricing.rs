//! Pricing and coupon engine.
//!
//! Pure computation over resolved checkout lines. The same inputs always
//! produce the same totals, so orders persisted at checkout time can be
//! re-verified against this module later.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{Coupon, CouponScope, OrderTotals};

/// Raw checkout line as submitted by the client: a product, one of its
/// pricing tiers by index, and a quantity.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLine {
    pub product_id: String,
    pub tier_index: usize,
    pub quantity: i64,
}

/// Checkout line resolved against the live catalog, carrying everything
/// the engine and the order snapshot need.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub product_id: String,
    pub product_name: String,
    pub category_slug: String,
    pub duration: String,
    pub unit_price: i64,
    pub quantity: i64,
}

/// Resolve checkout lines against the catalog.
///
/// A line referencing an unknown product or an out-of-range tier index is
/// a hard validation failure; the checkout is rejected rather than the
/// line silently contributing zero.
pub fn resolve_lines(conn: &Connection, lines: &[CheckoutLine]) -> Result<Vec<ResolvedLine>> {
    if lines.is_empty() {
        return Err(AppError::Validation("Your checkout is empty".into()));
    }

    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::Validation(
                "Item quantity must be at least 1".into(),
            ));
        }

        let product = queries::get_product_with_pricing(conn, &line.product_id)?.ok_or_else(
            || {
                AppError::Validation(format!(
                    "Product {} is no longer available",
                    line.product_id
                ))
            },
        )?;

        let tier = product.pricing.get(line.tier_index).ok_or_else(|| {
            AppError::Validation(format!(
                "Selected pricing option is no longer available for {}",
                product.product.name
            ))
        })?;

        resolved.push(ResolvedLine {
            product_id: product.product.id.clone(),
            product_name: product.product.name.clone(),
            category_slug: product.category_slug.clone(),
            duration: tier.duration.clone(),
            unit_price: tier.price,
            quantity: line.quantity,
        });
    }

    Ok(resolved)
}

fn line_matches_scope(coupon: &Coupon, line: &ResolvedLine) -> bool {
    match coupon.scope {
        CouponScope::AllProducts => true,
        CouponScope::Category => coupon.scope_value.as_deref() == Some(&line.category_slug),
        CouponScope::SingleProduct => coupon.scope_value.as_deref() == Some(&line.product_id),
    }
}

/// Reject a coupon that cannot apply to this cart: inactive, or scoped to
/// a category/product not present. Messages are user-facing.
pub fn check_coupon(coupon: &Coupon, lines: &[ResolvedLine]) -> Result<()> {
    if !coupon.active {
        return Err(AppError::Validation(
            "The coupon code is invalid or has expired".into(),
        ));
    }

    let applicable = !lines.is_empty() && lines.iter().any(|l| line_matches_scope(coupon, l));
    if !applicable {
        return Err(AppError::Validation(
            "Coupon is not valid for the items in your cart".into(),
        ));
    }

    Ok(())
}

/// Sum restricted to the lines the coupon's scope covers.
pub fn eligible_subtotal(coupon: &Coupon, lines: &[ResolvedLine]) -> i64 {
    lines
        .iter()
        .filter(|l| line_matches_scope(coupon, l))
        .map(|l| l.unit_price * l.quantity)
        .sum()
}

/// Compute `{subtotal, discount, total}` for a cart.
///
/// The caller is responsible for having accepted the coupon via
/// [`check_coupon`]; an inapplicable coupon here simply discounts
/// nothing. Total is clamped at zero.
pub fn compute_totals(lines: &[ResolvedLine], coupon: Option<&Coupon>) -> OrderTotals {
    let subtotal: i64 = lines.iter().map(|l| l.unit_price * l.quantity).sum();

    let discount = match coupon {
        Some(coupon) => {
            eligible_subtotal(coupon, lines) as f64 * coupon.discount_percentage as f64 / 100.0
        }
        None => 0.0,
    };

    let subtotal = subtotal as f64;
    OrderTotals {
        subtotal,
        discount,
        total: (subtotal - discount).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, category: &str, price: i64, qty: i64) -> ResolvedLine {
        ResolvedLine {
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            category_slug: category.to_string(),
            duration: "1 Month".to_string(),
            unit_price: price,
            quantity: qty,
        }
    }

    fn coupon(pct: u32, scope: CouponScope, scope_value: Option<&str>) -> Coupon {
        Coupon {
            id: "c1".to_string(),
            code: "TEST".to_string(),
            discount_percentage: pct,
            scope,
            scope_value: scope_value.map(String::from),
            active: true,
            created_at: 0,
        }
    }

    #[test]
    fn all_products_coupon_discounts_full_subtotal() {
        let lines = vec![line("a", "writing", 450, 1), line("b", "dev", 4000, 1)];
        let c = coupon(10, CouponScope::AllProducts, None);

        let totals = compute_totals(&lines, Some(&c));
        assert_eq!(totals.subtotal, 4450.0);
        assert_eq!(totals.discount, 445.0);
        assert_eq!(totals.total, 4005.0);
    }

    #[test]
    fn category_coupon_discounts_only_matching_lines() {
        let lines = vec![line("a", "writing", 450, 1), line("b", "dev", 4000, 1)];
        let c = coupon(10, CouponScope::Category, Some("writing"));

        let totals = compute_totals(&lines, Some(&c));
        assert_eq!(totals.subtotal, 4450.0);
        assert_eq!(totals.discount, 45.0);
        assert_eq!(totals.total, 4405.0);
    }

    #[test]
    fn single_product_coupon_scopes_by_product_id() {
        let lines = vec![line("a", "writing", 200, 2), line("b", "dev", 1000, 1)];
        let c = coupon(50, CouponScope::SingleProduct, Some("a"));

        let totals = compute_totals(&lines, Some(&c));
        assert_eq!(totals.discount, 200.0);
        assert_eq!(totals.total, 1200.0);
    }

    #[test]
    fn scoped_coupon_without_matching_item_is_rejected() {
        let lines = vec![line("a", "writing", 450, 1)];
        let c = coupon(20, CouponScope::Category, Some("special-offers"));

        assert!(check_coupon(&c, &lines).is_err());
        // Rejected coupons are never passed to compute_totals; the cart
        // total stays unchanged.
        let totals = compute_totals(&lines, None);
        assert_eq!(totals.total, 450.0);
    }

    #[test]
    fn inactive_coupon_is_rejected() {
        let lines = vec![line("a", "writing", 450, 1)];
        let mut c = coupon(10, CouponScope::AllProducts, None);
        c.active = false;

        assert!(check_coupon(&c, &lines).is_err());
    }

    #[test]
    fn total_never_goes_negative() {
        let lines = vec![line("a", "writing", 100, 1)];
        let c = coupon(100, CouponScope::AllProducts, None);

        let totals = compute_totals(&lines, Some(&c));
        assert_eq!(totals.discount, 100.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn recomputation_is_deterministic() {
        let lines = vec![line("a", "writing", 777, 3), line("b", "dev", 1234, 2)];
        let c = coupon(15, CouponScope::AllProducts, None);

        let first = compute_totals(&lines, Some(&c));
        let second = compute_totals(&lines, Some(&c));
        assert_eq!(first, second);
    }

    #[test]
    fn fractional_discounts_are_kept() {
        let lines = vec![line("a", "writing", 450, 1)];
        let c = coupon(15, CouponScope::AllProducts, None);

        let totals = compute_totals(&lines, Some(&c));
        assert_eq!(totals.discount, 67.5);
        assert_eq!(totals.total, 382.5);
    }
}
