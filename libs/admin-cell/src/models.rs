use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::account::{AccountStatus, UserAccount};
use shared_models::auth::Role;
use shared_models::error::AppError;

pub const USERS_PER_PAGE: u32 = 10;

// ==============================================================================
// USER MANAGEMENT
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl UserListQuery {
    /// 1-based page, anything below 1 reads as the first page.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<UserAccount>,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    #[serde(alias = "phone")]
    pub phone_number: Option<String>,
}

/// An empty body toggles the current status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserStatusRequest {
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

// ==============================================================================
// HOSPITALS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHospitalRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHospitalRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
}

// ==============================================================================
// ANALYTICS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PlatformAnalytics {
    pub total_users: usize,
    pub users_by_role: BTreeMap<String, usize>,
    pub total_appointments: usize,
    pub appointments_by_status: BTreeMap<String, usize>,
    pub pending_appointments: usize,
    pub total_labs: usize,
    pub total_hospitals: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("User not found")]
    UserNotFound,

    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        AdminError::DatabaseError(err.to_string())
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::UserNotFound | AdminError::HospitalNotFound => AppError::NotFound(err.to_string()),
            AdminError::ValidationError(msg) => AppError::ValidationError(msg),
            AdminError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
