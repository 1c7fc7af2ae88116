use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, AppError>;

/// Application error taxonomy, mapped onto HTTP status codes at the
/// response boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed request fields (400). Message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired credential (401).
    #[error("{0}")]
    Authentication(String),

    /// Valid credential but insufficient scope or missing CSRF (403).
    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate order / transaction id (409).
    #[error("{0}")]
    Conflict(String),

    /// Too many failed attempts (429). `retry_after_secs` is surfaced in
    /// both the body and the Retry-After header.
    #[error("too many failed attempts")]
    RateLimited { retry_after_secs: i64 },

    /// Payment provider unreachable or reported failure (502, retryable).
    #[error("upstream provider error: {0}")]
    Upstream(String),

    /// Database unavailable (503, retryable).
    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller. Upstream/database/internal detail
    /// stays in the logs; end users get a generic retry message.
    fn public_message(&self) -> String {
        match self {
            AppError::Upstream(_) => {
                "Payment provider is unavailable. Please try again.".to_string()
            }
            AppError::Database(_) => "Service temporarily unavailable. Please try again.".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upstream(detail) => tracing::error!(%detail, "upstream provider failure"),
            AppError::Database(detail) => tracing::error!(%detail, "database failure"),
            AppError::Internal(detail) => tracing::error!(%detail, "internal error"),
            _ => {}
        }

        let status = self.status();
        let mut response = (
            status,
            Json(json!({ "error": self.public_message() })),
        )
            .into_response();

        if let AppError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                return AppError::Conflict("duplicate record".to_string());
            }
        }
        AppError::Database(err.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_maps_to_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: orders.transaction_id".into()),
        );
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[test]
    fn upstream_detail_is_not_leaked() {
        let err = AppError::Upstream("connect timeout to payment.example.com".into());
        assert!(!err.public_message().contains("payment.example.com"));
    }
}
