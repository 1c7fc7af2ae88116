//! Access/refresh credential issuance and verification.
//!
//! HS256 tokens carrying the owning session id. Access tokens are
//! short-lived (long-lived with remember-me); refresh tokens mint new
//! access tokens without re-authentication while the session is alive.

use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const ACCESS_TTL_MINS: u64 = 15;
pub const REMEMBER_ME_TTL_DAYS: u64 = 30;
pub const REFRESH_TTL_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub session_id: String,
    pub role: String,
    pub token_type: TokenType,
}

pub struct TokenKeys {
    key: HS256Key,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
        }
    }

    pub fn issue_access(&self, session_id: &str, remember_me: bool) -> Result<String> {
        let ttl = if remember_me {
            Duration::from_days(REMEMBER_ME_TTL_DAYS)
        } else {
            Duration::from_mins(ACCESS_TTL_MINS)
        };
        self.issue(session_id, TokenType::Access, ttl)
    }

    pub fn issue_refresh(&self, session_id: &str) -> Result<String> {
        self.issue(
            session_id,
            TokenType::Refresh,
            Duration::from_days(REFRESH_TTL_DAYS),
        )
    }

    fn issue(&self, session_id: &str, token_type: TokenType, ttl: Duration) -> Result<String> {
        let claims = Claims::with_custom_claims(
            AdminClaims {
                session_id: session_id.to_string(),
                role: "admin".to_string(),
                token_type,
            },
            ttl,
        );
        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify signature and expiry, then check the token is of the
    /// expected kind so a refresh token can never pass as an access
    /// credential (or vice versa). No clock tolerance: a token past its
    /// TTL is rejected immediately.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<AdminClaims> {
        let options = VerificationOptions {
            time_tolerance: Some(Duration::from_secs(0)),
            ..Default::default()
        };
        let claims = self
            .key
            .verify_token::<AdminClaims>(token, Some(options))
            .map_err(|_| AppError::Authentication("Invalid or expired token".into()))?;

        if claims.custom.token_type != expected {
            return Err(AppError::Authentication("Invalid or expired token".into()));
        }

        Ok(claims.custom)
    }
}
