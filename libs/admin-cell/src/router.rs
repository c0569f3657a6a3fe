use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/{user_id}", put(handlers::update_user).delete(handlers::delete_user))
        .route("/users/{user_id}/status", put(handlers::update_user_status))
        .route("/hospitals", get(handlers::list_hospitals).post(handlers::create_hospital))
        .route(
            "/hospitals/{hospital_id}",
            put(handlers::update_hospital).delete(handlers::delete_hospital),
        )
        .route("/analytics", get(handlers::get_analytics))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
