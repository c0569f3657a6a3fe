use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use admin_cell::admin_routes;
use appointment_cell::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::doctor_routes;
use lab_cell::lab_routes;
use notification_cell::notification_routes;
use patient_cell::{family_routes, patient_routes};
use shared_config::AppConfig;
use shop_cell::shop_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "CareLink API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/api/appointments", appointment_routes(state.clone()))
        .nest("/api/notifications", notification_routes(state.clone()))
        .nest("/api/patients", patient_routes(state.clone()))
        .nest("/api/family", family_routes(state.clone()))
        .nest("/api/doctors", doctor_routes(state.clone()))
        .nest("/api/labs", lab_routes(state.clone()))
        .nest("/api/shops", shop_routes(state.clone()))
        .nest("/api/admin", admin_routes(state))
}
