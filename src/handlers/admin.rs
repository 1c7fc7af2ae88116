use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::auth::{SessionRecord, TokenType, generate_token};
use crate::db::{AppState, queries};
use crate::email::EmailSendResult;
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::authenticate_admin;
use crate::models::{OrderStatus, OrderWithItems};
use crate::pagination::{Paginated, PaginationQuery};
use crate::util::extract_request_info;

fn auth_cookie(
    name: &'static str,
    value: String,
    http_only: bool,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .http_only(http_only)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub session_id: String,
    pub csrf_token: String,
}

/// Admin login: rate-limit check first, then password verification
/// against the stored hash, then token + session + CSRF issuance.
///
/// Cookie attributes: access/session/csrf readable by client script for
/// header-based API calls; refresh HttpOnly; all SameSite=Lax, Secure
/// outside dev mode.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    // Opportunistic cleanup; there is no background scheduler.
    state.sessions.sweep();
    state.login_limiter.sweep();

    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }

    let (ip, user_agent) = extract_request_info(&headers);
    let client_key = ip.clone().unwrap_or_else(|| "unknown".to_string());

    // Lockout check runs before password verification, so a correct
    // password during cooldown still fails.
    state.login_limiter.check(&client_key)?;

    let conn = state.db.get()?;
    let site_config = queries::get_site_config(&conn)?;

    if !crate::auth::verify_password(&request.password, &site_config.admin_password_hash)? {
        state.login_limiter.record_failure(&client_key);
        tracing::warn!(ip = %client_key, "failed admin login attempt");
        return Err(AppError::Authentication("Invalid password".into()));
    }

    state.login_limiter.record_success(&client_key);

    let session_id = generate_token();
    let csrf_token = generate_token();
    let now = chrono::Utc::now().timestamp();
    state.sessions.put(SessionRecord {
        session_id: session_id.clone(),
        csrf_token: csrf_token.clone(),
        created_at: now,
        last_access: now,
        ip,
        user_agent,
    });

    let access_token = state.tokens.issue_access(&session_id, request.remember_me)?;
    let refresh_token = state.tokens.issue_refresh(&session_id)?;

    let secure = !state.dev_mode;
    let jar = jar
        .add(auth_cookie("access_token", access_token, false, secure))
        .add(auth_cookie("refresh_token", refresh_token, true, secure))
        .add(auth_cookie("session_id", session_id.clone(), false, secure))
        .add(auth_cookie("csrf_token", csrf_token.clone(), false, secure));

    tracing::info!(%session_id, "admin login successful");

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            session_id,
            csrf_token,
        }),
    ))
}

/// Logout: invalidate the session server-side and clear every auth
/// cookie. Requires a valid access credential.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    let ctx = authenticate_admin(&state, &headers)?;
    state.sessions.delete(&ctx.session.session_id);

    let jar = jar
        .remove(removal_cookie("access_token"))
        .remove(removal_cookie("refresh_token"))
        .remove(removal_cookie("session_id"))
        .remove(removal_cookie("csrf_token"));

    Ok((
        jar,
        Json(serde_json::json!({ "success": true, "message": "Logged out successfully" })),
    ))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
}

/// Mint a new access credential from a valid refresh credential, without
/// re-authentication, provided the session record still exists and is
/// within its absolute lifetime. A failure here means full re-login.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>)> {
    let refresh_token = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Authentication("Refresh token required".into()))?;

    let claims = state.tokens.verify(&refresh_token, TokenType::Refresh)?;

    state
        .sessions
        .get(&claims.session_id)
        .ok_or_else(|| AppError::Authentication("Session expired".into()))?;

    let (ip, user_agent) = extract_request_info(&headers);
    state.sessions.touch(&claims.session_id, ip, user_agent);

    let access_token = state.tokens.issue_access(&claims.session_id, false)?;
    let jar = jar.add(auth_cookie(
        "access_token",
        access_token.clone(),
        false,
        !state.dev_mode,
    ));

    Ok((
        jar,
        Json(RefreshResponse {
            success: true,
            access_token,
        }),
    ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<OrderWithItems>>> {
    let conn = state.db.get()?;
    let limit = query.limit();
    let offset = query.offset();
    let (orders, total) = queries::list_orders_paginated(&conn, limit, offset)?;
    Ok(Json(Paginated::new(orders, total, limit, offset)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderWithItems>> {
    let status: OrderStatus = request
        .status
        .parse()
        .map_err(|_| AppError::Validation("Invalid status".into()))?;

    let conn = state.db.get()?;

    if queries::get_order_by_order_id(&conn, &order_id)?.is_none() {
        return Err(AppError::NotFound("Order not found".into()));
    }

    queries::update_order_status(&conn, &order_id, status)?;
    tracing::info!(%order_id, status = status.as_ref(), "order status updated");

    let updated = queries::get_order_with_items(&conn, &order_id)?
        .ok_or_else(|| AppError::Internal("Failed to fetch updated order".into()))?;
    Ok(Json(updated))
}

/// Delete an order. Pending orders must be confirmed or cancelled first.
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    let order = queries::get_order_by_order_id(&conn, &order_id)?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if !order.status.is_deletable() {
        return Err(AppError::Conflict(
            "Pending orders cannot be deleted; confirm or cancel first".into(),
        ));
    }

    queries::delete_order(&conn, &order_id)?;
    tracing::info!(%order_id, "order deleted");

    Ok(Json(
        serde_json::json!({ "success": true, "message": "Order deleted successfully" }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub order_id: String,
    /// Optional access details (credentials, download links) appended to
    /// the email body.
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub result: EmailSendResult,
}

/// Send the product-access email for an order to its customer.
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>> {
    if request.order_id.trim().is_empty() {
        return Err(AppError::Validation("Order ID is required".into()));
    }

    let conn = state.db.get()?;
    let order = queries::get_order_with_items(&conn, &request.order_id)?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    drop(conn);

    let result = state
        .mailer
        .send_product_access(
            &order.order.customer.email,
            &order.order.customer.name,
            &order.order.order_id,
            &order.items,
            request.instructions.as_deref(),
        )
        .await?;

    Ok(Json(SendEmailResponse {
        success: true,
        result,
    }))
}
