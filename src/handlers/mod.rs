pub mod admin;
pub mod gateway;
pub mod orders;
pub mod public;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::db::AppState;
use crate::middleware::{admin_auth, admin_csrf};

pub fn router(state: AppState) -> Router {
    // State-changing admin routes also require the CSRF token issued at
    // login. admin_auth runs first (outermost), then admin_csrf.
    let admin_mutations = Router::new()
        .route(
            "/api/admin/orders/{order_id}",
            patch(admin::update_order_status).delete(admin::delete_order),
        )
        .route("/api/admin/send-email", post(admin::send_email))
        .layer(middleware::from_fn(admin_csrf));

    let admin_protected = Router::new()
        .route("/api/admin/orders", get(admin::list_orders))
        .merge(admin_mutations)
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .route("/api/health", get(public::health))
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::list_orders),
        )
        .route("/api/admin/auth", post(admin::login).delete(admin::logout))
        .route("/api/admin/refresh", post(admin::refresh))
        .route(
            "/api/rupantorpay/create-payment",
            post(gateway::create_payment),
        )
        .route("/api/rupantorpay/webhook", post(gateway::webhook))
        .route("/api/rupantorpay/verify", post(gateway::verify))
        .merge(admin_protected)
        .with_state(state)
}
