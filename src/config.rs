use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Externally-reachable base URL, used for gateway redirect/webhook
    /// URLs. Must be set explicitly in production.
    pub base_url: String,
    pub dev_mode: bool,
    /// Plaintext admin password, hashed into the site config row the
    /// first time the singleton is created.
    pub bootstrap_admin_password: Option<String>,
    /// HMAC secret for access/refresh tokens.
    pub jwt_secret: String,
    pub rupantorpay_api_key: String,
    pub rupantorpay_base_url: String,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    /// Failed login attempts allowed before lockout.
    pub login_max_attempts: u32,
    /// Rolling window for counting failed attempts, seconds.
    pub login_window_secs: i64,
    /// Lockout duration after too many failures, seconds.
    pub login_lockout_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("SUBMONTH_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "submonth.db".to_string()),
            base_url,
            dev_mode,
            bootstrap_admin_password: env::var("ADMIN_PASSWORD").ok(),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "submonth-dev-secret-change-in-production".to_string()),
            rupantorpay_api_key: env::var("RUPANTORPAY_API_KEY").unwrap_or_default(),
            rupantorpay_base_url: env::var("RUPANTORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://payment.rupantorpay.com/api/payment".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "support@submonth.com".to_string()),
            login_max_attempts: env::var("LOGIN_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            login_window_secs: env::var("LOGIN_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15 * 60),
            login_lockout_secs: env::var("LOGIN_LOCKOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30 * 60),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
