//! Shared helpers for integration tests: a temp-database AppState, a
//! seeded catalog, request plumbing, and a canned-response gateway mock.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use submonth::auth::{LoginRateLimiter, MemorySessionStore, TokenKeys, hash_password};
use submonth::db::{AppState, init_pool, init_schema, queries};
use submonth::email::Mailer;
use submonth::handlers;
use submonth::models::{Category, CouponScope, CreateCoupon, CreateProduct, Product};
use submonth::payments::RupantorPayClient;

pub const TEST_ADMIN_PASSWORD: &str = "admin123";
pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Build an AppState over a fresh temp database. The TempDir must stay
/// alive for the duration of the test.
pub fn create_test_state() -> (AppState, TempDir) {
    create_test_state_with_gateway("http://127.0.0.1:9")
}

/// Same, pointing the gateway client at a specific base URL (a mock, or
/// an unroutable port to exercise failure paths).
pub fn create_test_state_with_gateway(gateway_url: &str) -> (AppState, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("test.db");
    let pool = init_pool(path.to_str().unwrap()).expect("pool");

    {
        let conn = pool.get().unwrap();
        init_schema(&conn).unwrap();
        let hash = hash_password(TEST_ADMIN_PASSWORD).unwrap();
        queries::insert_site_config(&conn, &hash).unwrap();
    }

    let state = AppState {
        db: pool,
        base_url: "http://127.0.0.1:3000".to_string(),
        dev_mode: true,
        tokens: Arc::new(TokenKeys::from_secret(TEST_JWT_SECRET)),
        sessions: Arc::new(MemorySessionStore::default()),
        login_limiter: Arc::new(LoginRateLimiter::new(TEST_MAX_LOGIN_ATTEMPTS, 900, 1800)),
        gateway: RupantorPayClient::new("test-key", gateway_url, "http://127.0.0.1:3000"),
        mailer: Mailer::new(None, "support@test.invalid".to_string()),
    };

    (state, dir)
}

pub struct SeededCatalog {
    pub writing: Category,
    pub specials: Category,
    /// Tiers: "1 Month" 450, "1 Year" 4000.
    pub grammarly: Product,
    /// Tier: "1 Taka Special" 1.
    pub one_taka: Product,
}

/// Two categories, two products, and the coupons the worked examples use:
/// WELCOME10 (10%, all products), SPECIAL20 (20%, special-offers),
/// EXPIRED10 (inactive).
pub fn seed_catalog(state: &AppState) -> SeededCatalog {
    let conn = state.db.get().unwrap();

    let writing = queries::create_category(&conn, "Writing", "writing", "✍️").unwrap();
    let specials =
        queries::create_category(&conn, "Special Offers", "special-offers", "⭐").unwrap();

    let grammarly = queries::create_product(
        &conn,
        &CreateProduct {
            name: "Grammarly Premium".to_string(),
            slug: "grammarly-premium".to_string(),
            description: "Writing assistant".to_string(),
            long_description: String::new(),
            image_url: String::new(),
            category_id: writing.id.clone(),
            pricing: vec![("1 Month".to_string(), 450), ("1 Year".to_string(), 4000)],
        },
    )
    .unwrap();

    let one_taka = queries::create_product(
        &conn,
        &CreateProduct {
            name: "Special 1 Taka Deal".to_string(),
            slug: "one-taka-special".to_string(),
            description: "Trial deal".to_string(),
            long_description: String::new(),
            image_url: String::new(),
            category_id: specials.id.clone(),
            pricing: vec![("1 Taka Special".to_string(), 1)],
        },
    )
    .unwrap();

    queries::create_coupon(
        &conn,
        &CreateCoupon {
            code: "WELCOME10".to_string(),
            discount_percentage: 10,
            scope: CouponScope::AllProducts,
            scope_value: None,
            active: true,
        },
    )
    .unwrap();
    queries::create_coupon(
        &conn,
        &CreateCoupon {
            code: "SPECIAL20".to_string(),
            discount_percentage: 20,
            scope: CouponScope::Category,
            scope_value: Some("special-offers".to_string()),
            active: true,
        },
    )
    .unwrap();
    queries::create_coupon(
        &conn,
        &CreateCoupon {
            code: "EXPIRED10".to_string(),
            discount_percentage: 10,
            scope: CouponScope::AllProducts,
            scope_value: None,
            active: false,
        },
    )
    .unwrap();

    SeededCatalog {
        writing,
        specials,
        grammarly,
        one_taka,
    }
}

pub fn app(state: AppState) -> Router {
    handlers::router(state)
}

pub async fn send_request(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    }
}

pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = send_request(app, json_request("POST", uri, &body)).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = send_request(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Credentials captured from a successful login.
pub struct AdminSession {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
    pub session_id: String,
}

fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .and_then(|c| c.split(';').next())
        .map(|c| c[prefix.len()..].to_string())
}

pub async fn login_admin(state: &AppState) -> AdminSession {
    let response = send_request(
        app(state.clone()),
        json_request(
            "POST",
            "/api/admin/auth",
            &serde_json::json!({ "password": TEST_ADMIN_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");

    let access_token = cookie_value(&response, "access_token").expect("access cookie");
    let refresh_token = cookie_value(&response, "refresh_token").expect("refresh cookie");
    let body = body_json(response).await;

    AdminSession {
        access_token,
        refresh_token,
        csrf_token: body["csrf_token"].as_str().unwrap().to_string(),
        session_id: body["session_id"].as_str().unwrap().to_string(),
    }
}

/// Minimal HTTP server returning a fixed JSON body for every request.
/// Stands in for the payment provider.
pub async fn mock_gateway(response_body: serde_json::Value) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = response_body.to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}
