use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use notification_cell::NotificationError;
use shared_models::error::AppError;

// ==============================================================================
// LAB MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    pub test_name: String,
    pub test_type: Option<String>,
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lab {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub lab_id: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub hospital_id: Option<Uuid>,
    #[serde(default)]
    pub tests_offered: Vec<LabTest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lab {
    pub fn find_test(&self, test_name: &str) -> Option<&LabTest> {
        let wanted = test_name.trim();
        self.tests_offered
            .iter()
            .find(|t| t.test_name.eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLabProfileRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub tests_offered: Option<Vec<LabTest>>,
}

// ==============================================================================
// ORDER MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LabOrderStatus {
    Ordered,
    SampleCollected,
    Completed,
    Cancelled,
}

impl fmt::Display for LabOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabOrderStatus::Ordered => write!(f, "Ordered"),
            LabOrderStatus::SampleCollected => write!(f, "Sample Collected"),
            LabOrderStatus::Completed => write!(f, "Completed"),
            LabOrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTestOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub lab_id: Uuid,
    pub test_name: String,
    pub test_type: Option<String>,
    pub price: f64,
    pub order_date: DateTime<Utc>,
    pub status: LabOrderStatus,
    pub report_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabOrderRequest {
    #[serde(alias = "lab_id")]
    pub lab_id: Uuid,
    #[serde(alias = "test_name")]
    pub test_name: String,
    #[serde(alias = "test_type")]
    pub test_type: Option<String>,
    pub price: Option<f64>,
    #[serde(alias = "order_date")]
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: LabOrderStatus,
    pub report_url: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("Lab not found")]
    NotFound,

    #[error("Lab profile not found")]
    ProfileNotFound,

    #[error("Patient profile not found")]
    PatientNotFound,

    #[error("Lab test order not found")]
    OrderNotFound,

    #[error("Test '{0}' is not offered by this lab")]
    TestNotOffered(String),

    #[error("Not authorized to {0}")]
    Forbidden(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for LabError {
    fn from(err: anyhow::Error) -> Self {
        LabError::DatabaseError(err.to_string())
    }
}

impl From<LabError> for AppError {
    fn from(err: LabError) -> Self {
        match err {
            LabError::NotFound
            | LabError::ProfileNotFound
            | LabError::PatientNotFound
            | LabError::OrderNotFound => AppError::NotFound(err.to_string()),
            LabError::TestNotOffered(_) => AppError::BadRequest(err.to_string()),
            LabError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            LabError::ValidationError(msg) => AppError::ValidationError(msg),
            LabError::Notification(err) => err.into(),
            LabError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
