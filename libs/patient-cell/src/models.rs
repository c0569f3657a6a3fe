use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Human-readable code shown on cards and in doctor notifications.
    pub patient_id: String,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    /// Set on family members; points at the booking user's own record.
    pub primary_patient_id: Option<Uuid>,
    pub relationship: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdatePatientRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.dob.is_none()
            && self.gender.is_none()
            && self.blood_group.is_none()
            && self.profile_picture.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFamilyMemberRequest {
    pub name: String,
    pub relationship: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient profile not found")]
    NotFound,

    #[error("Family member not found")]
    FamilyMemberNotFound,

    #[error("Not authorized to access this patient")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for PatientError {
    fn from(err: anyhow::Error) -> Self {
        PatientError::DatabaseError(err.to_string())
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound | PatientError::FamilyMemberNotFound => AppError::NotFound(err.to_string()),
            PatientError::Unauthorized => AppError::Forbidden(err.to_string()),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
