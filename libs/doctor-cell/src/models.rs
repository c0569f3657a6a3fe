use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};

use shared_models::error::AppError;
use shared_models::time::{hhmm, option_hhmm};

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

/// User fields embedded on doctor reads via `user:users(...)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorUser {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hospital_id: Option<Uuid>,
    pub specialty: String,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub average_rating: f32,
    #[serde(default)]
    pub number_of_reviews: i32,
    pub is_available: bool,
    #[serde(with = "hhmm")]
    pub consultation_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub consultation_end: NaiveTime,
    pub slot_duration_minutes: i32,
    #[serde(default)]
    pub working_days: Vec<Weekday>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<DoctorUser>,
}

impl Doctor {
    pub fn display_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.phone_number.as_deref())
    }

    pub fn works_on(&self, day: Weekday) -> bool {
        self.working_days.contains(&day)
    }
}

/// Embed used by every doctor read.
pub const DOCTOR_SELECT: &str = "*,user:users(name,phone_number,profile_picture)";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorQuery {
    pub hospital_id: Option<Uuid>,
    pub specialty: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    pub specialty: Option<String>,
    pub qualifications: Option<Vec<String>>,
    pub is_available: Option<bool>,
    #[serde(default, with = "option_hhmm")]
    pub consultation_start: Option<NaiveTime>,
    #[serde(default, with = "option_hhmm")]
    pub consultation_end: Option<NaiveTime>,
    pub slot_duration_minutes: Option<i32>,
    pub working_days: Option<Vec<Weekday>>,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailableSlot {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayAvailability {
    FullyAvailable,
    PartiallyAvailable,
    Unavailable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

/// `month` is 1-based.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

/// Booked time as read back from the appointments table.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedSlot {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

// ==============================================================================
// MY PATIENTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PatientVisit {
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub patient: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorPatientSummary {
    pub patient_id: Uuid,
    pub patient: Option<serde_json::Value>,
    pub appointment_count: usize,
    pub last_visit: NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor profile not found")]
    ProfileNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for DoctorError {
    fn from(err: anyhow::Error) -> Self {
        DoctorError::DatabaseError(err.to_string())
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound | DoctorError::ProfileNotFound => AppError::NotFound(err.to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
