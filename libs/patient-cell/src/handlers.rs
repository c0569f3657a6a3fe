use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
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

use crate::models::{AddFamilyMemberRequest, PatientError, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient], "view a patient profile")?;
    let service = PatientService::new(&state);

    let patient = service.get_by_user(&user.id, auth.token()).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_my_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient], "update a patient profile")?;
    let service = PatientService::new(&state);

    let patient = service.update_profile(&user.id, request, auth.token()).await?;
    Ok(Json(json!(patient)))
}

/// Admins and doctors may read any patient; patients only records on their account.
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let role = require_role(&user, &[Role::Admin, Role::Doctor, Role::Patient], "view patients")?;
    let service = PatientService::new(&state);

    let patient = service.get(patient_id, auth.token()).await?;
    if role == Role::Patient && patient.user_id.to_string() != user.id {
        return Err(PatientError::Unauthorized.into());
    }

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_my_family_members(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient], "view family members")?;
    let service = PatientService::new(&state);

    let members = service.list_family_members(&user.id, auth.token()).await?;
    Ok(Json(json!(members)))
}

#[axum::debug_handler]
pub async fn add_family_member(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AddFamilyMemberRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient], "add family members")?;
    let service = PatientService::new(&state);

    let member = service.add_family_member(&user.id, request, auth.token()).await?;
    Ok(Json(json!(member)))
}

#[axum::debug_handler]
pub async fn remove_family_member(
    State(state): State<Arc<AppConfig>>,
    Path(member_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Patient], "remove family members")?;
    let service = PatientService::new(&state);

    service.remove_family_member(&user.id, member_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Family member removed" })))
}
