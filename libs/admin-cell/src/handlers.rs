use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
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

use crate::models::{
    CreateHospitalRequest, UpdateHospitalRequest, UpdateUserRequest, UpdateUserStatusRequest,
    UserListQuery,
};
use crate::services::{AnalyticsService, HospitalService, UserAdminService};

fn require_admin(user: &User) -> Result<(), AppError> {
    require_role(user, &[Role::Admin], "access admin resources").map(|_| ())
}

// ==============================================================================
// USERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<UserListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = UserAdminService::new(&state);

    let page = service.list(&query, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = UserAdminService::new(&state);

    let account = service.update(user_id, request, auth.token()).await?;
    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn update_user_status(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateUserStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = UserAdminService::new(&state);

    let account = service.set_status(user_id, request, auth.token()).await?;
    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = UserAdminService::new(&state);

    service.delete(user_id, auth.token()).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}

// ==============================================================================
// HOSPITALS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = HospitalService::new(&state);

    let hospitals = service.list(auth.token()).await?;
    Ok(Json(json!(hospitals)))
}

#[axum::debug_handler]
pub async fn create_hospital(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateHospitalRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;
    let service = HospitalService::new(&state);

    let hospital = service.create(request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(hospital))))
}

#[axum::debug_handler]
pub async fn update_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = HospitalService::new(&state);

    let hospital = service.update(hospital_id, request, auth.token()).await?;
    Ok(Json(json!(hospital)))
}

#[axum::debug_handler]
pub async fn delete_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = HospitalService::new(&state);

    service.delete(hospital_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Hospital deleted" })))
}

// ==============================================================================
// ANALYTICS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_analytics(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let service = AnalyticsService::new(&state);

    let analytics = service.overview(auth.token()).await?;
    Ok(Json(json!(analytics)))
}
