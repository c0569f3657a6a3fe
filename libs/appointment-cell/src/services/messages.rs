// libs/appointment-cell/src/services/messages.rs
//! Text of the notifications and SMS sent around a booking.

use chrono::{NaiveDate, NaiveTime};

use shared_models::time::{display_date, format_slot_time};

use crate::models::AppointmentStatus;

pub const CREATED_TITLE: &str = "Appointment Created";
pub const REQUEST_TITLE: &str = "New Appointment Request";
pub const STATUS_TITLE: &str = "Appointment Status Update";

/// Names and codes as they appear in messages, with the usual fallbacks applied.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub patient_name: String,
    pub patient_code: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl MessageContext {
    pub fn new(
        patient_name: Option<&str>,
        patient_code: Option<&str>,
        doctor_name: Option<&str>,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Self {
        Self {
            patient_name: non_empty(patient_name).unwrap_or("Patient").to_string(),
            patient_code: non_empty(patient_code).unwrap_or("N/A").to_string(),
            doctor_name: non_empty(doctor_name).unwrap_or("your doctor").to_string(),
            date,
            time,
        }
    }

    fn when(&self) -> String {
        format!("on {} at {}", display_date(&self.date), format_slot_time(&self.time))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn patient_created(ctx: &MessageContext, token_number: i32) -> String {
    format!(
        "Your appointment for {} with Dr. {} {} is pending. Your token number is {}.",
        ctx.patient_name, ctx.doctor_name, ctx.when(), token_number
    )
}

pub fn doctor_created(ctx: &MessageContext, token_number: i32) -> String {
    format!(
        "New appointment request from {} (ID: {}) {}. Token: {}.",
        ctx.patient_name, ctx.patient_code, ctx.when(), token_number
    )
}

pub fn patient_status(ctx: &MessageContext, status: AppointmentStatus) -> String {
    format!("Your appointment with Dr. {} {} is now {}.", ctx.doctor_name, ctx.when(), status)
}

pub fn doctor_status(ctx: &MessageContext, status: AppointmentStatus) -> String {
    format!(
        "Appointment for {} (ID: {}) {} is now {}.",
        ctx.patient_name, ctx.patient_code, ctx.when(), status
    )
}

/// SMS to the patient's account holder; `greeting_name` is the user's own name.
pub fn patient_status_sms(ctx: &MessageContext, greeting_name: &str, status: AppointmentStatus) -> String {
    format!(
        "Hello {}, your appointment with Dr. {} {} has been {}.",
        greeting_name, ctx.doctor_name, ctx.when(), status
    )
}

pub fn doctor_status_sms(ctx: &MessageContext, status: AppointmentStatus) -> String {
    format!(
        "Hello Dr. {}, the appointment for {} (ID: {}) {} has been {}.",
        ctx.doctor_name, ctx.patient_name, ctx.patient_code, ctx.when(), status
    )
}

pub fn patient_link(appointment_id: &uuid::Uuid) -> String {
    format!("/patient/appointments/{}", appointment_id)
}

pub fn doctor_link(appointment_id: &uuid::Uuid) -> String {
    format!("/doctor/appointments/{}", appointment_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(patient: Option<&str>, code: Option<&str>, doctor: Option<&str>) -> MessageContext {
        MessageContext::new(
            patient,
            code,
            doctor,
            NaiveDate::from_ymd_opt(2025, 10, 14).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_created_messages() {
        let ctx = ctx(Some("Asha Menon"), Some("PAT-0001"), Some("Priya Raman"));

        assert_eq!(
            patient_created(&ctx, 4),
            "Your appointment for Asha Menon with Dr. Priya Raman on Tue Oct 14 2025 at 10:30 is pending. Your token number is 4."
        );
        assert_eq!(
            doctor_created(&ctx, 4),
            "New appointment request from Asha Menon (ID: PAT-0001) on Tue Oct 14 2025 at 10:30. Token: 4."
        );
    }

    #[test]
    fn test_status_messages_use_fallbacks() {
        let ctx = ctx(None, Some("  "), None);

        assert_eq!(
            patient_status(&ctx, AppointmentStatus::Confirmed),
            "Your appointment with Dr. your doctor on Tue Oct 14 2025 at 10:30 is now Confirmed."
        );
        assert_eq!(
            doctor_status(&ctx, AppointmentStatus::Cancelled),
            "Appointment for Patient (ID: N/A) on Tue Oct 14 2025 at 10:30 is now Cancelled."
        );
    }

    #[test]
    fn test_status_sms() {
        let ctx = ctx(Some("Meera Menon"), Some("PAT-0002"), Some("Priya Raman"));

        assert_eq!(
            patient_status_sms(&ctx, "Asha Menon", AppointmentStatus::Completed),
            "Hello Asha Menon, your appointment with Dr. Priya Raman on Tue Oct 14 2025 at 10:30 has been Completed."
        );
        assert_eq!(
            doctor_status_sms(&ctx, AppointmentStatus::Completed),
            "Hello Dr. Priya Raman, the appointment for Meera Menon (ID: PAT-0002) on Tue Oct 14 2025 at 10:30 has been Completed."
        );
    }
}
