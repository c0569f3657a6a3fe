// libs/lab-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{CreateLabOrderRequest, UpdateLabProfileRequest, UpdateOrderStatusRequest};
use crate::services::{LabOrderService, LabService};

// ==============================================================================
// DIRECTORY & PROFILE
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_labs(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = LabService::new(&state);

    let labs = service.available_labs(auth.token()).await?;
    Ok(Json(json!(labs)))
}

#[axum::debug_handler]
pub async fn get_lab_tests(
    State(state): State<Arc<AppConfig>>,
    Path(lab_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = LabService::new(&state);

    let tests = service.tests_for(lab_id, auth.token()).await?;
    Ok(Json(json!(tests)))
}

#[axum::debug_handler]
pub async fn get_lab_profile(
    State(state): State<Arc<AppConfig>>,
    Path(lab_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = LabService::new(&state);

    let lab = service.get_profile(lab_id, &user, auth.token()).await?;
    Ok(Json(json!(lab)))
}

#[axum::debug_handler]
pub async fn update_lab_profile(
    State(state): State<Arc<AppConfig>>,
    Path(lab_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateLabProfileRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Lab, Role::Admin], "update lab profiles")?;
    let service = LabService::new(&state);

    let lab = service.update_profile(lab_id, &user, request, auth.token()).await?;
    Ok(Json(json!(lab)))
}

// ==============================================================================
// TEST ORDERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_lab_order(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateLabOrderRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, &[Role::Patient], "order lab tests")?;
    let service = LabOrderService::new(&state);

    let order = service.create_order(&user, request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(order))))
}

#[axum::debug_handler]
pub async fn get_my_lab_orders(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient], "view patient lab orders")?;
    let service = LabOrderService::new(&state);

    let orders = service.my_orders(&user, auth.token()).await?;
    Ok(Json(json!(orders)))
}

#[axum::debug_handler]
pub async fn get_lab_orders(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Lab], "view lab orders")?;
    let service = LabOrderService::new(&state);

    let orders = service.lab_orders(&user, auth.token()).await?;
    Ok(Json(json!(orders)))
}

#[axum::debug_handler]
pub async fn update_lab_order_status(
    State(state): State<Arc<AppConfig>>,
    Path(order_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Lab], "update lab orders")?;
    let service = LabOrderService::new(&state);

    let order = service.update_status(order_id, &user, request, auth.token()).await?;
    Ok(Json(json!(order)))
}
