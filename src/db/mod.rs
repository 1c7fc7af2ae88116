pub mod from_row;
pub mod queries;
pub mod seed;

use std::sync::Arc;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::auth::{LoginRateLimiter, SessionStore, TokenKeys};
use crate::config::Config;
use crate::email::Mailer;
use crate::error::Result;
use crate::payments::RupantorPayClient;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Shared per-request application state.
///
/// Session and rate-limit stores are injected here rather than held as
/// process-wide globals so tests (and a future external store) can swap
/// them out.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub base_url: String,
    pub dev_mode: bool,
    pub tokens: Arc<TokenKeys>,
    pub sessions: Arc<dyn SessionStore>,
    pub login_limiter: Arc<LoginRateLimiter>,
    pub gateway: RupantorPayClient,
    pub mailer: Mailer,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = init_pool(&config.database_path)?;

        {
            let conn = pool.get()?;
            init_schema(&conn)?;
            reconcile_site_config(&conn, config)?;
        }

        Ok(Self {
            db: pool,
            base_url: config.base_url.clone(),
            dev_mode: config.dev_mode,
            tokens: Arc::new(TokenKeys::from_secret(&config.jwt_secret)),
            sessions: Arc::new(crate::auth::MemorySessionStore::default()),
            login_limiter: Arc::new(LoginRateLimiter::new(
                config.login_max_attempts,
                config.login_window_secs,
                config.login_lockout_secs,
            )),
            gateway: RupantorPayClient::new(
                &config.rupantorpay_api_key,
                &config.rupantorpay_base_url,
                &config.base_url,
            ),
            mailer: Mailer::new(config.resend_api_key.clone(), config.email_from.clone()),
        })
    }
}

pub fn init_pool(path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Ok(r2d2::Pool::new(manager)?)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            icon TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            long_description TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            stock_out INTEGER NOT NULL DEFAULT 0,
            category_id TEXT NOT NULL REFERENCES categories(id),
            created_at INTEGER NOT NULL,
            UNIQUE (category_id, slug)
        );

        CREATE TABLE IF NOT EXISTS pricing (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            duration TEXT NOT NULL,
            price INTEGER NOT NULL,
            position INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pricing_product ON pricing(product_id, position);

        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            rating INTEGER NOT NULL,
            comment TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS hot_deals (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            custom_title TEXT
        );

        CREATE TABLE IF NOT EXISTS coupons (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            discount_percentage INTEGER NOT NULL,
            scope TEXT NOT NULL,
            scope_value TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        );

        -- order_id and transaction_id uniqueness are the authoritative
        -- dedupe guards for racing checkout/webhook inserts.
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL UNIQUE,
            customer_name TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            customer_address TEXT,
            payment_method TEXT NOT NULL,
            transaction_id TEXT UNIQUE,
            subtotal REAL NOT NULL,
            discount REAL NOT NULL,
            total REAL NOT NULL,
            status TEXT NOT NULL,
            coupon_code TEXT,
            coupon_discount_percentage INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at);

        CREATE TABLE IF NOT EXISTS order_items (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id TEXT NOT NULL,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            duration TEXT NOT NULL,
            unit_price INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);

        CREATE TABLE IF NOT EXISTS site_config (
            id TEXT PRIMARY KEY,
            hero_banner TEXT NOT NULL,
            contact_phone TEXT NOT NULL,
            contact_whatsapp TEXT NOT NULL,
            contact_email TEXT NOT NULL,
            admin_password_hash TEXT NOT NULL,
            usd_to_bdt_rate REAL NOT NULL,
            hero_slider_interval_ms INTEGER NOT NULL,
            hot_deals_speed INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )?;
    Ok(())
}

/// Enforce the site-config singleton invariant.
///
/// Creates the row (hashing the bootstrap admin password) when missing.
/// Multiple rows are a data-integrity bug: the newest row wins and the
/// rest are dropped, loudly.
pub fn reconcile_site_config(conn: &Connection, config: &Config) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM site_config", [], |row| row.get(0))?;

    if count == 0 {
        let password = config
            .bootstrap_admin_password
            .as_deref()
            .unwrap_or("admin123");
        if config.bootstrap_admin_password.is_none() && !config.dev_mode {
            tracing::warn!("ADMIN_PASSWORD not set; using the default bootstrap password");
        }
        let hash = crate::auth::hash_password(password)?;
        queries::insert_site_config(conn, &hash)?;
        tracing::info!("created site config singleton");
        return Ok(());
    }

    if count > 1 {
        tracing::warn!(rows = count, "duplicate site_config rows found, keeping newest");
        conn.execute(
            "DELETE FROM site_config WHERE id NOT IN
             (SELECT id FROM site_config ORDER BY updated_at DESC, created_at DESC LIMIT 1)",
            [],
        )?;
    }

    Ok(())
}
