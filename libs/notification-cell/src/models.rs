// libs/notification-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// NOTIFICATION FEED MODELS
// ==============================================================================

/// Which kind of record a notification is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecipientModel {
    Patient,
    Doctor,
    Lab,
    Shop,
    Admin,
}

impl fmt::Display for RecipientModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipientModel::Patient => write!(f, "Patient"),
            RecipientModel::Doctor => write!(f, "Doctor"),
            RecipientModel::Lab => write!(f, "Lab"),
            RecipientModel::Shop => write!(f, "Shop"),
            RecipientModel::Admin => write!(f, "Admin"),
        }
    }
}

impl RecipientModel {
    /// Table holding the recipient record, `None` for admins who are
    /// addressed by their user id.
    pub fn profile_table(&self) -> Option<&'static str> {
        match self {
            RecipientModel::Patient => Some("patients"),
            RecipientModel::Doctor => Some("doctors"),
            RecipientModel::Lab => Some("labs"),
            RecipientModel::Shop => Some("shops"),
            RecipientModel::Admin => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationCategory {
    Appointment,
    LabTest,
    Account,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub on_model: RecipientModel,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub on_model: RecipientModel,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub link: Option<String>,
}

/// Resolved owner of a notification feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient {
    pub id: Uuid,
    pub model: RecipientModel,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<u32>,
}

// ==============================================================================
// MESSAGING MODELS
// ==============================================================================

/// How a messaging failure is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Log the failure and report "nothing sent".
    #[default]
    BestEffort,
    /// Return the failure as an error.
    Strict,
}

/// Vendor acknowledgement for a queued SMS or call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryReceipt {
    pub sid: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub more_info: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("No {0} profile found for this user")]
    RecipientNotFound(RecipientModel),

    #[error("Notifications are not available for this role")]
    UnsupportedRole,

    #[error("Not authorized to modify this notification")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for NotificationError {
    fn from(err: anyhow::Error) -> Self {
        NotificationError::Database(err.to_string())
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound | NotificationError::RecipientNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            NotificationError::UnsupportedRole | NotificationError::Forbidden => {
                AppError::Forbidden(err.to_string())
            }
            NotificationError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessagingError {
    #[error("Invalid phone number format: {0}")]
    InvalidPhoneNumber(String),

    #[error("Messaging provider is not configured")]
    NotConfigured,

    #[error("Twilio error {code:?}: {message}")]
    Provider {
        status: u16,
        code: Option<i64>,
        message: String,
        more_info: Option<String>,
    },

    #[error("Messaging transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for MessagingError {
    fn from(err: reqwest::Error) -> Self {
        MessagingError::Transport(err.to_string())
    }
}
