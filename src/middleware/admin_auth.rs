use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::auth::{SessionRecord, TokenType};
use crate::db::AppState;
use crate::error::AppError;
use crate::util::{extract_bearer_token, extract_request_info};

#[derive(Clone)]
pub struct AdminContext {
    pub session: SessionRecord,
}

/// Pull the access credential from the Authorization header, falling back
/// to the `access_token` cookie (set non-HttpOnly for exactly this kind
/// of client-side API call).
fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get("access_token")
        .map(|c| c.value().to_string())
}

/// Authenticate an admin request: verify the access token, then confirm
/// the owning session still exists and is within its absolute lifetime.
pub fn authenticate_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AdminContext, AppError> {
    let token = extract_access_token(headers)
        .ok_or_else(|| AppError::Authentication("Authorization required".into()))?;

    let claims = state.tokens.verify(&token, TokenType::Access)?;

    let session = state
        .sessions
        .get(&claims.session_id)
        .ok_or_else(|| AppError::Authentication("Session expired".into()))?;

    let (ip, user_agent) = extract_request_info(headers);
    state.sessions.touch(&claims.session_id, ip, user_agent);

    Ok(AdminContext { session })
}

pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Opportunistic cleanup; there is no background scheduler.
    state.sessions.sweep();
    state.login_limiter.sweep();

    let ctx = authenticate_admin(&state, request.headers())?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// CSRF guard for state-changing admin requests. Runs inside
/// `admin_auth`; the `x-csrf-token` header must match the token stored
/// in the session record at login.
pub async fn admin_csrf(request: Request, next: Next) -> Result<Response, AppError> {
    let ctx = request
        .extensions()
        .get::<AdminContext>()
        .ok_or_else(|| AppError::Authentication("Authorization required".into()))?;

    let presented = request
        .headers()
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Authorization("CSRF token required".into()))?;

    if presented != ctx.session.csrf_token {
        return Err(AppError::Authorization("Invalid CSRF token".into()));
    }

    Ok(next.run(request).await)
}
