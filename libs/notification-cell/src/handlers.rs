// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::NotificationQuery;
use crate::services::NotificationService;

#[axum::debug_handler]
pub async fn get_my_notifications(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let recipient = service.resolve_recipient(&user, token).await?;
    let notifications = service.list_for_recipient(recipient, &query, token).await?;

    Ok(Json(json!(notifications)))
}

#[axum::debug_handler]
pub async fn get_unread_count(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let recipient = service.resolve_recipient(&user, token).await?;
    let count = service.unread_count(recipient, token).await?;

    Ok(Json(json!({ "unread": count })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<AppConfig>>,
    Path(notification_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let recipient = service.resolve_recipient(&user, token).await?;
    let notification = service.mark_read(notification_id, recipient, token).await?;

    Ok(Json(json!(notification)))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let recipient = service.resolve_recipient(&user, token).await?;
    let updated = service.mark_all_read(recipient, token).await?;

    Ok(Json(json!({ "updated": updated })))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<Arc<AppConfig>>,
    Path(notification_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let recipient = service.resolve_recipient(&user, token).await?;
    service.delete(notification_id, recipient, token).await?;

    Ok(Json(json!({ "message": "Notification removed" })))
}
