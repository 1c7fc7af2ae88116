//! Dev-mode demo catalog.
//!
//! Seeds a small set of categories, products with pricing tiers, and
//! coupons so the checkout pipeline has something to sell. Skipped when
//! the catalog already has rows.

use rusqlite::Connection;

use crate::error::Result;
use crate::models::{CouponScope, CreateCoupon, CreateProduct};

use super::queries;

pub fn seed_demo_catalog(conn: &Connection) -> Result<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(());
    }

    let productivity = queries::create_category(conn, "Productivity", "productivity", "💼")?;
    let design = queries::create_category(conn, "Design Tools", "design-tools", "🎨")?;
    let development = queries::create_category(conn, "Development", "development", "💻")?;
    let specials = queries::create_category(conn, "Special Offers", "special-offers", "⭐")?;

    queries::create_product(
        conn,
        &CreateProduct {
            name: "Grammarly Premium".to_string(),
            slug: "grammarly-premium".to_string(),
            description: "Advanced writing assistant and plagiarism checker".to_string(),
            long_description: "Full access to Grammarly Premium's tone suggestions, \
                clarity rewrites, and plagiarism detection."
                .to_string(),
            image_url: "/images/grammarly.png".to_string(),
            category_id: productivity.id.clone(),
            pricing: vec![
                ("1 Month".to_string(), 450),
                ("6 Months".to_string(), 2200),
                ("1 Year".to_string(), 4000),
            ],
        },
    )?;

    queries::create_product(
        conn,
        &CreateProduct {
            name: "Canva Pro".to_string(),
            slug: "canva-pro".to_string(),
            description: "Design anything with premium templates and assets".to_string(),
            long_description: "Canva Pro unlocks the full template library, background \
                remover, and brand kits."
                .to_string(),
            image_url: "/images/canva.png".to_string(),
            category_id: design.id.clone(),
            pricing: vec![
                ("1 Month".to_string(), 350),
                ("1 Year".to_string(), 3200),
            ],
        },
    )?;

    queries::create_product(
        conn,
        &CreateProduct {
            name: "GitHub Copilot".to_string(),
            slug: "github-copilot".to_string(),
            description: "AI pair programmer for your editor".to_string(),
            long_description: "Copilot individual subscription with completions and chat."
                .to_string(),
            image_url: "/images/copilot.png".to_string(),
            category_id: development.id.clone(),
            pricing: vec![
                ("1 Month".to_string(), 1100),
                ("1 Year".to_string(), 11000),
            ],
        },
    )?;

    let one_taka = queries::create_product(
        conn,
        &CreateProduct {
            name: "Special 1 Taka Deal".to_string(),
            slug: "one-taka-special".to_string(),
            description: "Exclusive digital product for just 1 taka".to_string(),
            long_description: "Limited-time trial deal for first-time customers.".to_string(),
            image_url: "/images/one-taka.png".to_string(),
            category_id: specials.id.clone(),
            pricing: vec![("1 Taka Special".to_string(), 1)],
        },
    )?;

    queries::create_hot_deal(conn, &one_taka.id, Some("MEGA DEAL - Only 1 Taka!"))?;

    queries::create_coupon(
        conn,
        &CreateCoupon {
            code: "WELCOME10".to_string(),
            discount_percentage: 10,
            scope: CouponScope::AllProducts,
            scope_value: None,
            active: true,
        },
    )?;
    queries::create_coupon(
        conn,
        &CreateCoupon {
            code: "SPECIAL20".to_string(),
            discount_percentage: 20,
            scope: CouponScope::Category,
            scope_value: Some("special-offers".to_string()),
            active: true,
        },
    )?;
    queries::create_coupon(
        conn,
        &CreateCoupon {
            code: "FIRST15".to_string(),
            discount_percentage: 15,
            scope: CouponScope::AllProducts,
            scope_value: None,
            active: true,
        },
    )?;

    tracing::info!("seeded demo catalog");
    Ok(())
}
