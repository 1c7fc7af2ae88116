mod password;
mod rate_limit;
mod session;
mod tokens;

pub use password::{hash_password, verify_password};
pub use rate_limit::LoginRateLimiter;
pub use session::{
    MemorySessionStore, SESSION_MAX_AGE_SECS, SessionRecord, SessionStore, generate_token,
};
pub use tokens::{AdminClaims, REFRESH_TTL_DAYS, TokenKeys, TokenType};
