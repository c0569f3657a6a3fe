use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// SHOP MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub license_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub plan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateShopProfileRequest {
    pub name: Option<String>,
    pub license_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub plan: Option<String>,
}

// ==============================================================================
// STAFF MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StaffRole {
    Pharmacist,
    Cashier,
    Manager,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffRole::Pharmacist => write!(f, "Pharmacist"),
            StaffRole::Cashier => write!(f, "Cashier"),
            StaffRole::Manager => write!(f, "Manager"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopStaff {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub role: StaffRole,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role arrives optional so a missing one reports as a validation error
/// rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct AddStaffRequest {
    #[serde(default)]
    pub name: String,
    pub role: Option<StaffRole>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("Shop profile not found")]
    ProfileNotFound,

    #[error("Staff member not found")]
    StaffNotFound,

    #[error("Staff member belongs to another shop")]
    StaffOfOtherShop,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for ShopError {
    fn from(err: anyhow::Error) -> Self {
        ShopError::DatabaseError(err.to_string())
    }
}

impl From<ShopError> for AppError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::ProfileNotFound | ShopError::StaffNotFound => AppError::NotFound(err.to_string()),
            ShopError::StaffOfOtherShop => AppError::Forbidden(err.to_string()),
            ShopError::ValidationError(msg) => AppError::ValidationError(msg),
            ShopError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
