// libs/notification-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn notification_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::get_my_notifications))
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/read-all", put(handlers::mark_all_notifications_read))
        .route("/{notification_id}/read", put(handlers::mark_notification_read))
        .route("/{notification_id}", delete(handlers::delete_notification))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
