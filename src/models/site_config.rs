use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub whatsapp: String,
    pub email: String,
}

/// Singleton configuration row. Exactly one live row is authoritative;
/// duplicates are reconciled at startup, not supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub id: String,
    pub hero_banner: Vec<String>,
    pub contact: ContactInfo,
    /// Argon2 hash; never serialized to API responses.
    #[serde(skip_serializing)]
    pub admin_password_hash: String,
    pub usd_to_bdt_rate: f64,
    pub hero_slider_interval_ms: i64,
    pub hot_deals_speed: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
