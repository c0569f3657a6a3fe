use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/profile", get(handlers::get_my_profile).put(handlers::update_my_profile))
        .route("/my-patients", get(handlers::get_my_patients))
        .route("/available-slots/{doctor_id}", get(handlers::get_available_slots))
        .route("/daily-availability/{doctor_id}", get(handlers::get_daily_availability))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
