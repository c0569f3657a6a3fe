// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use notification_cell::NotificationError;
use shared_models::error::AppError;
use shared_models::time::{hhmm, option_hhmm};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub token_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Populated on reads that embed related records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<AppointmentPatient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<AppointmentDoctor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<AppointmentHospital>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "Pending"),
            AppointmentStatus::Confirmed => write!(f, "Confirmed"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "Rescheduled"),
        }
    }
}

/// Name and contact of the user behind a patient or doctor record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartyUser {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentPatient {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub patient_id: Option<String>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PartyUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDoctor {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PartyUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentHospital {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
}

/// Embed for fully populated appointment reads.
pub const APPOINTMENT_SELECT: &str = "*,\
patient:patients(id,user_id,patient_id,name,user:users(name,phone_number,profile_picture)),\
doctor:doctors(id,user_id,specialty,user:users(name,phone_number,profile_picture)),\
hospital:hospitals(id,name,location)";

impl Appointment {
    pub fn patient_user_id(&self) -> Option<Uuid> {
        self.patient.as_ref().and_then(|p| p.user_id)
    }

    pub fn doctor_user_id(&self) -> Option<Uuid> {
        self.doctor.as_ref().and_then(|d| d.user_id)
    }

    /// True when `user_id` is the user behind the patient or the doctor.
    pub fn involves_user(&self, user_id: &str) -> bool {
        [self.patient_user_id(), self.doctor_user_id()]
            .into_iter()
            .flatten()
            .any(|id| id.to_string() == user_id)
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Either a concrete doctor or the first available one at the hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctorChoice {
    FirstAvailable,
    Doctor(Uuid),
}

impl FromStr for DoctorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "first_available" {
            return Ok(DoctorChoice::FirstAvailable);
        }
        Uuid::parse_str(s)
            .map(DoctorChoice::Doctor)
            .map_err(|_| format!("Invalid doctor id: {}", s))
    }
}

impl<'de> Deserialize<'de> for DoctorChoice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: DoctorChoice,
    pub hospital_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub reason: Option<String>,
    pub specialty: Option<String>,
    pub for_family_member_id: Option<Uuid>,
}

/// Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<NaiveDate>,
    #[serde(default, with = "option_hhmm")]
    pub time: Option<NaiveTime>,
    pub reason: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub token_number: Option<i32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient profile not found")]
    PatientNotFound,

    #[error("Family member patient profile not found")]
    FamilyMemberNotFound,

    #[error("Primary patient profile not found for this user")]
    PrimaryPatientNotFound,

    #[error("Not authorized to book for this family member")]
    FamilyMemberForbidden,

    #[error("Doctor profile not found")]
    DoctorProfileNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Specialty is required for first available booking")]
    SpecialtyRequired,

    #[error("No doctors available for this specialty at this hospital.")]
    NoDoctorAvailable,

    #[error("Doctor is not available for appointments")]
    DoctorUnavailable,

    #[error("Doctor already has an appointment at this time in this hospital")]
    SlotTaken,

    #[error("Not authorized to {0} this appointment")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::DatabaseError(err.to_string())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::FamilyMemberNotFound
            | AppointmentError::PrimaryPatientNotFound
            | AppointmentError::DoctorProfileNotFound
            | AppointmentError::DoctorNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SpecialtyRequired
            | AppointmentError::NoDoctorAvailable
            | AppointmentError::DoctorUnavailable
            | AppointmentError::SlotTaken => AppError::BadRequest(err.to_string()),
            AppointmentError::FamilyMemberForbidden | AppointmentError::Unauthorized(_) => {
                AppError::Forbidden(err.to_string())
            }
            AppointmentError::Notification(err) => err.into(),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
