//! Row-mapping helpers shared by the query layer.
//!
//! Each model lists its column set once; `query_one`/`query_all` pair a
//! SELECT over those columns with the model's `FromRow` implementation.

use rusqlite::types::Type;
use rusqlite::{Connection, Params, Row};

use crate::error::Result;
use crate::models::*;

pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, |row| T::from_row(row))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| T::from_row(row))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Parse a TEXT column through `FromStr`, surfacing bad stored values as
/// conversion failures instead of panics.
fn parse_text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub const CATEGORY_COLS: &str = "id, name, slug, icon";

impl FromRow for Category {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            icon: row.get(3)?,
        })
    }
}

pub const PRODUCT_COLS: &str =
    "id, name, slug, description, long_description, image_url, stock_out, category_id, created_at";

impl FromRow for Product {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            long_description: row.get(4)?,
            image_url: row.get(5)?,
            stock_out: row.get::<_, i64>(6)? != 0,
            category_id: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

pub const PRICING_COLS: &str = "id, product_id, duration, price, position";

impl FromRow for PricingTier {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PricingTier {
            id: row.get(0)?,
            product_id: row.get(1)?,
            duration: row.get(2)?,
            price: row.get(3)?,
            position: row.get(4)?,
        })
    }
}

pub const REVIEW_COLS: &str = "id, product_id, name, rating, comment, created_at";

impl FromRow for Review {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Review {
            id: row.get(0)?,
            product_id: row.get(1)?,
            name: row.get(2)?,
            rating: row.get(3)?,
            comment: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

pub const HOT_DEAL_COLS: &str = "id, product_id, custom_title";

impl FromRow for HotDeal {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(HotDeal {
            id: row.get(0)?,
            product_id: row.get(1)?,
            custom_title: row.get(2)?,
        })
    }
}

pub const COUPON_COLS: &str =
    "id, code, discount_percentage, scope, scope_value, active, created_at";

impl FromRow for Coupon {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Coupon {
            id: row.get(0)?,
            code: row.get(1)?,
            discount_percentage: row.get::<_, i64>(2)? as u32,
            scope: parse_text_column(row, 3)?,
            scope_value: row.get(4)?,
            active: row.get::<_, i64>(5)? != 0,
            created_at: row.get(6)?,
        })
    }
}

pub const ORDER_COLS: &str = "id, order_id, customer_name, customer_phone, customer_email, \
     customer_address, payment_method, transaction_id, subtotal, discount, total, status, \
     coupon_code, coupon_discount_percentage, created_at, updated_at";

impl FromRow for Order {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let coupon_code: Option<String> = row.get(12)?;
        let coupon = match coupon_code {
            Some(code) => Some(CouponSnapshot {
                code,
                discount_percentage: row.get::<_, i64>(13)? as u32,
            }),
            None => None,
        };

        Ok(Order {
            id: row.get(0)?,
            order_id: row.get(1)?,
            customer: CustomerInfo {
                name: row.get(2)?,
                phone: row.get(3)?,
                email: row.get(4)?,
                address: row.get(5)?,
            },
            payment: PaymentInfo {
                method: row.get(6)?,
                transaction_id: row.get(7)?,
            },
            totals: OrderTotals {
                subtotal: row.get(8)?,
                discount: row.get(9)?,
                total: row.get(10)?,
            },
            status: parse_text_column(row, 11)?,
            coupon,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

pub const ORDER_ITEM_COLS: &str =
    "id, order_id, product_id, name, quantity, duration, unit_price";

impl FromRow for OrderItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(OrderItem {
            id: row.get(0)?,
            order_id: row.get(1)?,
            product_id: row.get(2)?,
            name: row.get(3)?,
            quantity: row.get(4)?,
            duration: row.get(5)?,
            unit_price: row.get(6)?,
        })
    }
}

pub const SITE_CONFIG_COLS: &str = "id, hero_banner, contact_phone, contact_whatsapp, \
     contact_email, admin_password_hash, usd_to_bdt_rate, hero_slider_interval_ms, \
     hot_deals_speed, created_at, updated_at";

impl FromRow for SiteConfig {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SiteConfig {
            id: row.get(0)?,
            hero_banner: parse_json_column(row, 1)?,
            contact: ContactInfo {
                phone: row.get(2)?,
                whatsapp: row.get(3)?,
                email: row.get(4)?,
            },
            admin_password_hash: row.get(5)?,
            usd_to_bdt_rate: row.get(6)?,
            hero_slider_interval_ms: row.get(7)?,
            hot_deals_speed: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}
