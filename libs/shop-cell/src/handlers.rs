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

use crate::models::{AddStaffRequest, UpdateShopProfileRequest};
use crate::services::ShopService;

#[axum::debug_handler]
pub async fn get_my_shop(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Shop], "view a shop profile")?;
    let service = ShopService::new(&state);

    let shop = service.get_by_user(&user.id, auth.token()).await?;
    Ok(Json(json!(shop)))
}

#[axum::debug_handler]
pub async fn update_my_shop(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateShopProfileRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Shop], "update a shop profile")?;
    let service = ShopService::new(&state);

    let shop = service.update_profile(&user.id, request, auth.token()).await?;
    Ok(Json(json!(shop)))
}

#[axum::debug_handler]
pub async fn get_staff(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Shop], "manage shop staff")?;
    let service = ShopService::new(&state);

    let staff = service.list_staff(&user.id, auth.token()).await?;
    Ok(Json(json!(staff)))
}

#[axum::debug_handler]
pub async fn add_staff(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AddStaffRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, &[Role::Shop], "manage shop staff")?;
    let service = ShopService::new(&state);

    let staff = service.add_staff(&user.id, request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(staff))))
}

#[axum::debug_handler]
pub async fn remove_staff(
    State(state): State<Arc<AppConfig>>,
    Path(staff_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Shop], "manage shop staff")?;
    let service = ShopService::new(&state);

    service.remove_staff(&user.id, staff_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Staff member removed" })))
}
