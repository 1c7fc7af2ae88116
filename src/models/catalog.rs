use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Unique within its category.
    pub slug: String,
    pub description: String,
    pub long_description: String,
    pub image_url: String,
    pub stock_out: bool,
    pub category_id: String,
    pub created_at: i64,
}

/// One named pricing option for a product (e.g. "1 Month" vs "1 Year").
/// Owned exclusively by its product; `position` preserves display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: String,
    pub product_id: String,
    pub duration: String,
    /// Whole-taka amount in the store's base currency.
    pub price: i64,
    pub position: i64,
}

/// Product together with its ordered pricing tiers and owning category
/// slug, as resolved for checkout.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithPricing {
    #[serde(flatten)]
    pub product: Product,
    pub category_slug: String,
    pub pricing: Vec<PricingTier>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub image_url: String,
    pub category_id: String,
    /// (duration label, price) pairs, in display order.
    pub pricing: Vec<(String, i64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotDeal {
    pub id: String,
    pub product_id: String,
    pub custom_title: Option<String>,
}
