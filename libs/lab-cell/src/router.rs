// libs/lab-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn lab_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/available", get(handlers::get_available_labs))
        .route("/{lab_id}/tests", get(handlers::get_lab_tests))
        .route(
            "/profile/{lab_id}",
            get(handlers::get_lab_profile).put(handlers::update_lab_profile),
        )
        .route("/lab-test-orders", post(handlers::create_lab_order))
        .route("/lab-test-orders/mine", get(handlers::get_my_lab_orders))
        .route("/lab-test-orders/lab", get(handlers::get_lab_orders))
        .route("/lab-test-orders/{order_id}/status", put(handlers::update_lab_order_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
