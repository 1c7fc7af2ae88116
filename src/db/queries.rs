use chrono::Utc;
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    CATEGORY_COLS, COUPON_COLS, HOT_DEAL_COLS, ORDER_COLS, ORDER_ITEM_COLS, PRICING_COLS,
    PRODUCT_COLS, REVIEW_COLS, SITE_CONFIG_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Categories ============

pub fn create_category(conn: &Connection, name: &str, slug: &str, icon: &str) -> Result<Category> {
    let id = gen_id();

    conn.execute(
        "INSERT INTO categories (id, name, slug, icon) VALUES (?1, ?2, ?3, ?4)",
        params![&id, name, slug, icon],
    )?;

    Ok(Category {
        id,
        name: name.to_string(),
        slug: slug.to_string(),
        icon: icon.to_string(),
    })
}

pub fn get_category_by_id(conn: &Connection, id: &str) -> Result<Option<Category>> {
    query_one(
        conn,
        &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLS),
        params![id],
    )
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    query_all(
        conn,
        &format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLS),
        [],
    )
}

// ============ Products ============

/// Create a product together with its ordered pricing tiers.
pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO products (id, name, slug, description, long_description, image_url, stock_out, category_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
        params![
            &id,
            &input.name,
            &input.slug,
            &input.description,
            &input.long_description,
            &input.image_url,
            &input.category_id,
            now
        ],
    )?;

    for (position, (duration, price)) in input.pricing.iter().enumerate() {
        conn.execute(
            "INSERT INTO pricing (id, product_id, duration, price, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![gen_id(), &id, duration, price, position as i64],
        )?;
    }

    Ok(Product {
        id,
        name: input.name.clone(),
        slug: input.slug.clone(),
        description: input.description.clone(),
        long_description: input.long_description.clone(),
        image_url: input.image_url.clone(),
        stock_out: false,
        category_id: input.category_id.clone(),
        created_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        params![id],
    )
}

pub fn list_product_pricing(conn: &Connection, product_id: &str) -> Result<Vec<PricingTier>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM pricing WHERE product_id = ?1 ORDER BY position",
            PRICING_COLS
        ),
        params![product_id],
    )
}

/// Resolve a product with its tiers and category slug, as the checkout
/// pipeline needs it.
pub fn get_product_with_pricing(
    conn: &Connection,
    id: &str,
) -> Result<Option<ProductWithPricing>> {
    let Some(product) = get_product_by_id(conn, id)? else {
        return Ok(None);
    };

    let category_slug: String = conn.query_row(
        "SELECT slug FROM categories WHERE id = ?1",
        params![&product.category_id],
        |row| row.get(0),
    )?;

    let pricing = list_product_pricing(conn, id)?;

    Ok(Some(ProductWithPricing {
        product,
        category_slug,
        pricing,
    }))
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    query_all(
        conn,
        &format!("SELECT {} FROM products ORDER BY created_at DESC", PRODUCT_COLS),
        [],
    )
}

/// Repoint a pricing tier at a new price. Used by admin catalog edits;
/// existing order item snapshots are unaffected.
pub fn update_pricing_price(conn: &Connection, tier_id: &str, price: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE pricing SET price = ?1 WHERE id = ?2",
        params![price, tier_id],
    )?;
    Ok(affected > 0)
}

// ============ Reviews & hot deals ============

pub fn create_review(
    conn: &Connection,
    product_id: &str,
    name: &str,
    rating: i32,
    comment: &str,
) -> Result<Review> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO reviews (id, product_id, name, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, product_id, name, rating, comment, now],
    )?;

    Ok(Review {
        id,
        product_id: product_id.to_string(),
        name: name.to_string(),
        rating,
        comment: comment.to_string(),
        created_at: now,
    })
}

pub fn list_reviews_for_product(conn: &Connection, product_id: &str) -> Result<Vec<Review>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM reviews WHERE product_id = ?1 ORDER BY created_at DESC",
            REVIEW_COLS
        ),
        params![product_id],
    )
}

pub fn create_hot_deal(
    conn: &Connection,
    product_id: &str,
    custom_title: Option<&str>,
) -> Result<HotDeal> {
    let id = gen_id();

    conn.execute(
        "INSERT INTO hot_deals (id, product_id, custom_title) VALUES (?1, ?2, ?3)",
        params![&id, product_id, custom_title],
    )?;

    Ok(HotDeal {
        id,
        product_id: product_id.to_string(),
        custom_title: custom_title.map(String::from),
    })
}

pub fn list_hot_deals(conn: &Connection) -> Result<Vec<HotDeal>> {
    query_all(
        conn,
        &format!("SELECT {} FROM hot_deals", HOT_DEAL_COLS),
        [],
    )
}

// ============ Coupons ============

pub fn create_coupon(conn: &Connection, input: &CreateCoupon) -> Result<Coupon> {
    input.validate()?;

    let id = gen_id();
    let now = now();
    let code = input.code.trim().to_uppercase();

    conn.execute(
        "INSERT INTO coupons (id, code, discount_percentage, scope, scope_value, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &id,
            &code,
            input.discount_percentage,
            input.scope.as_ref(),
            &input.scope_value,
            input.active as i64,
            now
        ],
    )?;

    Ok(Coupon {
        id,
        code,
        discount_percentage: input.discount_percentage,
        scope: input.scope,
        scope_value: input.scope_value.clone(),
        active: input.active,
        created_at: now,
    })
}

/// Look up a coupon by code, case-insensitively.
pub fn get_coupon_by_code(conn: &Connection, code: &str) -> Result<Option<Coupon>> {
    query_one(
        conn,
        &format!("SELECT {} FROM coupons WHERE code = ?1", COUPON_COLS),
        params![code.trim().to_uppercase()],
    )
}

pub fn set_coupon_active(conn: &Connection, id: &str, active: bool) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE coupons SET active = ?1 WHERE id = ?2",
        params![active as i64, id],
    )?;
    Ok(affected > 0)
}

// ============ Orders ============

/// Persist an order with its item snapshots in one transaction.
///
/// The UNIQUE constraints on order_id / transaction_id convert racing
/// duplicate inserts into a `Conflict` error.
pub fn create_order(conn: &mut Connection, input: &NewOrder) -> Result<OrderWithItems> {
    let id = gen_id();
    let now = now();

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO orders (id, order_id, customer_name, customer_phone, customer_email,
            customer_address, payment_method, transaction_id, subtotal, discount, total,
            status, coupon_code, coupon_discount_percentage, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            &id,
            &input.order_id,
            &input.customer.name,
            &input.customer.phone,
            &input.customer.email,
            &input.customer.address,
            &input.payment.method,
            &input.payment.transaction_id,
            input.totals.subtotal,
            input.totals.discount,
            input.totals.total,
            input.status.as_ref(),
            input.coupon.as_ref().map(|c| c.code.clone()),
            input.coupon.as_ref().map(|c| c.discount_percentage as i64),
            now,
            now
        ],
    )?;

    let mut items = Vec::with_capacity(input.items.len());
    for item in &input.items {
        let item_id = gen_id();
        tx.execute(
            "INSERT INTO order_items (id, order_id, product_id, name, quantity, duration, unit_price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &item_id,
                &id,
                &item.product_id,
                &item.name,
                item.quantity,
                &item.duration,
                item.unit_price
            ],
        )?;
        items.push(OrderItem {
            id: item_id,
            order_id: id.clone(),
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            duration: item.duration.clone(),
            unit_price: item.unit_price,
        });
    }

    tx.commit()?;

    Ok(OrderWithItems {
        order: Order {
            id,
            order_id: input.order_id.clone(),
            customer: input.customer.clone(),
            payment: input.payment.clone(),
            totals: input.totals,
            status: input.status,
            coupon: input.coupon.clone(),
            created_at: now,
            updated_at: now,
        },
        items,
    })
}

pub fn get_order_by_order_id(conn: &Connection, order_id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE order_id = ?1", ORDER_COLS),
        params![order_id],
    )
}

/// Fast-path webhook dedupe; the UNIQUE constraint remains the
/// authoritative guard.
pub fn get_order_by_transaction_id(
    conn: &Connection,
    transaction_id: &str,
) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE transaction_id = ?1", ORDER_COLS),
        params![transaction_id],
    )
}

pub fn list_order_items(conn: &Connection, order_pk: &str) -> Result<Vec<OrderItem>> {
    query_all(
        conn,
        &format!("SELECT {} FROM order_items WHERE order_id = ?1", ORDER_ITEM_COLS),
        params![order_pk],
    )
}

pub fn get_order_with_items(conn: &Connection, order_id: &str) -> Result<Option<OrderWithItems>> {
    let Some(order) = get_order_by_order_id(conn, order_id)? else {
        return Ok(None);
    };
    let items = list_order_items(conn, &order.id)?;
    Ok(Some(OrderWithItems { order, items }))
}

/// Fetch orders for a customer-supplied id list (order history).
/// Unknown ids are simply absent from the result.
pub fn list_orders_by_order_ids(
    conn: &Connection,
    order_ids: &[String],
) -> Result<Vec<OrderWithItems>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders: Vec<String> = (1..=order_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT {} FROM orders WHERE order_id IN ({}) ORDER BY created_at DESC",
        ORDER_COLS,
        placeholders.join(", ")
    );

    let params: Vec<&dyn rusqlite::ToSql> =
        order_ids.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let orders: Vec<Order> = query_all(conn, &sql, params.as_slice())?;

    let mut results = Vec::with_capacity(orders.len());
    for order in orders {
        let items = list_order_items(conn, &order.id)?;
        results.push(OrderWithItems { order, items });
    }
    Ok(results)
}

pub fn list_orders_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<OrderWithItems>, i64)> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;

    let orders: Vec<Order> = query_all(
        conn,
        &format!(
            "SELECT {} FROM orders ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            ORDER_COLS
        ),
        params![limit, offset],
    )?;

    let mut results = Vec::with_capacity(orders.len());
    for order in orders {
        let items = list_order_items(conn, &order.id)?;
        results.push(OrderWithItems { order, items });
    }

    Ok((results, total))
}

pub fn update_order_status(
    conn: &Connection,
    order_id: &str,
    status: OrderStatus,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET status = ?1, updated_at = ?2 WHERE order_id = ?3",
        params![status.as_ref(), now(), order_id],
    )?;
    Ok(affected > 0)
}

/// Delete an order and (by cascade) its items. The status gate lives in
/// the handler; this is the raw operation.
pub fn delete_order(conn: &Connection, order_id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM orders WHERE order_id = ?1", params![order_id])?;
    Ok(deleted > 0)
}

// ============ Site config ============

pub fn get_site_config(conn: &Connection) -> Result<SiteConfig> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM site_config ORDER BY updated_at DESC LIMIT 1",
            SITE_CONFIG_COLS
        ),
        [],
    )?
    .ok_or_else(|| AppError::Internal("site config missing".into()))
}

pub fn insert_site_config(conn: &Connection, admin_password_hash: &str) -> Result<SiteConfig> {
    let id = gen_id();
    let now = now();
    let hero_banner = vec![
        "Welcome to SubMonth - Your Digital Subscription Store!".to_string(),
        "Premium Tools at Affordable Prices".to_string(),
        "Instant Delivery - Start Using Today!".to_string(),
    ];
    let contact = ContactInfo {
        phone: "+8801234567890".to_string(),
        whatsapp: "+8801234567890".to_string(),
        email: "support@submonth.com".to_string(),
    };

    conn.execute(
        "INSERT INTO site_config (id, hero_banner, contact_phone, contact_whatsapp, contact_email,
            admin_password_hash, usd_to_bdt_rate, hero_slider_interval_ms, hot_deals_speed,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &id,
            serde_json::to_string(&hero_banner)?,
            &contact.phone,
            &contact.whatsapp,
            &contact.email,
            admin_password_hash,
            110.0,
            5000,
            40,
            now,
            now
        ],
    )?;

    Ok(SiteConfig {
        id,
        hero_banner,
        contact,
        admin_password_hash: admin_password_hash.to_string(),
        usd_to_bdt_rate: 110.0,
        hero_slider_interval_ms: 5000,
        hot_deals_speed: 40,
        created_at: now,
        updated_at: now,
    })
}

pub fn update_admin_password_hash(conn: &Connection, id: &str, hash: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE site_config SET admin_password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        params![hash, now(), id],
    )?;
    Ok(affected > 0)
}
