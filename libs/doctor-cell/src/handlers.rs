use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{DoctorQuery, MonthQuery, SlotsQuery, UpdateDoctorProfileRequest};
use crate::services::{AvailabilityService, DoctorService};

// ==============================================================================
// DIRECTORY
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctors = service.list(&query, auth.token()).await?;
    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.get(doctor_id, auth.token()).await?;
    Ok(Json(json!(doctor)))
}

// ==============================================================================
// OWN PROFILE
// ==============================================================================

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor], "view a doctor profile")?;
    let service = DoctorService::new(&state);

    let doctor = service.get_by_user(&user.id, auth.token()).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_my_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor], "update a doctor profile")?;
    let service = DoctorService::new(&state);

    let doctor = service.update_profile(&user.id, request, auth.token()).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_my_patients(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor], "view patients")?;
    let service = DoctorService::new(&state);

    let patients = service.my_patients(&user.id, auth.token()).await?;
    Ok(Json(json!(patients)))
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    debug!("Available slots for doctor {} on {}", doctor_id, query.date);
    let service = AvailabilityService::new(&state);

    let slots = service.available_slots(doctor_id, query.date, auth.token()).await?;
    Ok(Json(json!(slots)))
}

#[axum::debug_handler]
pub async fn get_daily_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let days = service.daily_availability(doctor_id, query.year, query.month, auth.token()).await?;
    Ok(Json(json!(days)))
}
