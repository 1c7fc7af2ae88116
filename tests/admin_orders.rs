//! Admin order-management tests: listing, status transitions, the
//! delete gate, and the product-access email endpoint.

mod common;
use common::*;

use axum::body::Body;
use axum::http::Request;

async fn create_manual_order(state: &submonth::db::AppState, trx: &str) -> String {
    let catalog = {
        let conn = state.db.get().unwrap();
        let products = submonth::db::queries::list_products(&conn).unwrap();
        products[0].id.clone()
    };

    let (status, created) = post_json(
        app(state.clone()),
        "/api/orders",
        serde_json::json!({
            "customer": {
                "name": "Rahim Uddin",
                "phone": "+8801712345678",
                "email": "rahim@example.com"
            },
            "payment_method": "nagad",
            "transaction_id": trx,
            "items": [
                { "product_id": catalog, "tier_index": 0, "quantity": 1 }
            ]
        }),
    )
    .await;
    assert_eq!(status, 201);
    created["order_id"].as_str().unwrap().to_string()
}

fn admin_request(
    session: &AdminSession,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", session.access_token))
        .header("x-csrf-token", session.csrf_token.clone());
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

#[tokio::test]
async fn order_list_is_paginated_newest_first() {
    let (state, _dir) = create_test_state();
    seed_catalog(&state);
    let session = login_admin(&state).await;

    for trx in ["T1", "T2", "T3"] {
        create_manual_order(&state, trx).await;
    }

    let response = send_request(
        app(state.clone()),
        admin_request(&session, "GET", "/api/admin/orders?limit=2&offset=0", None),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;

    assert_eq!(body["total"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["limit"], 2);
}

#[tokio::test]
async fn status_transitions_are_validated() {
    let (state, _dir) = create_test_state();
    seed_catalog(&state);
    let session = login_admin(&state).await;
    let order_id = create_manual_order(&state, "T1").await;

    // Unknown status value.
    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "PATCH",
            &format!("/api/admin/orders/{}", order_id),
            Some(serde_json::json!({ "status": "Shipped" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 400);

    // Valid transition.
    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "PATCH",
            &format!("/api/admin/orders/{}", order_id),
            Some(serde_json::json!({ "status": "Cancelled" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Cancelled");
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (state, _dir) = create_test_state();
    let session = login_admin(&state).await;

    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "PATCH",
            "/api/admin/orders/ORD-MISSING",
            Some(serde_json::json!({ "status": "Confirmed" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn pending_orders_cannot_be_deleted() {
    let (state, _dir) = create_test_state();
    seed_catalog(&state);
    let session = login_admin(&state).await;
    let order_id = create_manual_order(&state, "T1").await;

    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "DELETE",
            &format!("/api/admin/orders/{}", order_id),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), 409);

    // Confirm, then delete.
    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "PATCH",
            &format!("/api/admin/orders/{}", order_id),
            Some(serde_json::json!({ "status": "Confirmed" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 200);

    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "DELETE",
            &format!("/api/admin/orders/{}", order_id),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), 200);

    let conn = state.db.get().unwrap();
    assert!(
        submonth::db::queries::get_order_by_order_id(&conn, &order_id)
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn deleting_an_order_removes_its_items() {
    let (state, _dir) = create_test_state();
    seed_catalog(&state);
    let session = login_admin(&state).await;
    let order_id = create_manual_order(&state, "T1").await;

    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "PATCH",
            &format!("/api/admin/orders/{}", order_id),
            Some(serde_json::json!({ "status": "Cancelled" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 200);

    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "DELETE",
            &format!("/api/admin/orders/{}", order_id),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), 200);

    let conn = state.db.get().unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM order_items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0, "order items must cascade with the order");
}

#[tokio::test]
async fn send_email_without_a_configured_key_reports_no_api_key() {
    let (state, _dir) = create_test_state();
    seed_catalog(&state);
    let session = login_admin(&state).await;
    let order_id = create_manual_order(&state, "T1").await;

    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "POST",
            "/api/admin/send-email",
            Some(serde_json::json!({ "order_id": order_id, "instructions": "Login: x / y" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["result"], "no_api_key");
}

#[tokio::test]
async fn send_email_for_unknown_order_is_not_found() {
    let (state, _dir) = create_test_state();
    let session = login_admin(&state).await;

    let response = send_request(
        app(state.clone()),
        admin_request(
            &session,
            "POST",
            "/api/admin/send-email",
            Some(serde_json::json!({ "order_id": "ORD-MISSING" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 404);
}
