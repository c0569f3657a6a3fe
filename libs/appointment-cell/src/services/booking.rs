// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::{Doctor, DoctorError, DoctorService};
use notification_cell::{Messenger, ReminderScheduler, TwilioClient};
use patient_cell::{Patient, PatientError, PatientService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Role, User};
use shared_models::time::format_slot_time;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, CreateAppointmentRequest, DoctorChoice,
    PartyUser, UpdateAppointmentRequest, APPOINTMENT_SELECT,
};
use crate::services::messages::MessageContext;
use crate::services::notify::AppointmentNotifier;

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

/// A stored booking plus the reminder call it scheduled, if any.
pub struct BookingOutcome {
    pub appointment: Appointment,
    pub reminder: Option<JoinHandle<()>>,
}

/// An updated appointment plus any status SMS still in flight.
pub struct UpdateOutcome {
    pub appointment: Appointment,
    pub sms_tasks: Vec<JoinHandle<()>>,
}

pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    patients: PatientService,
    doctors: DoctorService,
    notifier: AppointmentNotifier,
    reminders: ReminderScheduler,
    recorded_call_url: String,
    reminder_lead: chrono::Duration,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_messenger(config, Arc::new(TwilioClient::new(config)))
    }

    pub fn with_messenger(config: &AppConfig, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            patients: PatientService::new(config),
            doctors: DoctorService::new(config),
            notifier: AppointmentNotifier::new(config, Arc::clone(&messenger)),
            reminders: ReminderScheduler::new(messenger),
            recorded_call_url: config.twilio_recorded_call_url.clone(),
            reminder_lead: chrono::Duration::minutes(config.reminder_lead()),
        }
    }

    // ==========================================================================
    // READS
    // ==========================================================================

    pub async fn list_all(&self, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?select={}&order=date.desc,time.desc", APPOINTMENT_SELECT);
        Ok(self.supabase.select(&path, auth_token).await?)
    }

    /// Appointments visible to the caller: own and family bookings for patients,
    /// own schedule for doctors, everything for anyone else.
    pub async fn my_appointments(&self, user: &User, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = match user.platform_role() {
            Some(Role::Patient) => {
                let primary = self.patients.get_by_user(&user.id, auth_token).await
                    .map_err(|e| patient_error(e, AppointmentError::PatientNotFound))?;
                let family = self.patients.list_family_members(&user.id, auth_token).await
                    .map_err(|e| patient_error(e, AppointmentError::PatientNotFound))?;

                let ids: Vec<String> = std::iter::once(primary.id)
                    .chain(family.iter().map(|m| m.id))
                    .map(|id| id.to_string())
                    .collect();
                debug!("Loading appointments for {} patient records of user {}", ids.len(), user.id);
                format!("patient_id=in.({})&", ids.join(","))
            }
            Some(Role::Doctor) => {
                let doctor = self.doctors.get_by_user(&user.id, auth_token).await
                    .map_err(|e| doctor_error(e, AppointmentError::DoctorProfileNotFound))?;
                format!("doctor_id=eq.{}&", doctor.id)
            }
            _ => String::new(),
        };

        let path = format!(
            "/rest/v1/appointments?{}select={}&order=date.desc,time.desc",
            filter, APPOINTMENT_SELECT
        );
        Ok(self.supabase.select(&path, auth_token).await?)
    }

    pub async fn get_by_id(&self, appointment_id: Uuid, auth_token: &str) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&select={}", appointment_id, APPOINTMENT_SELECT);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Admins, the patient's account holder and the appointment's doctor.
    pub fn authorize(appointment: &Appointment, user: &User, action: &'static str) -> Result<(), AppointmentError> {
        if user.is_admin() || appointment.involves_user(&user.id) {
            Ok(())
        } else {
            Err(AppointmentError::Unauthorized(action))
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    pub async fn create(
        &self,
        user: &User,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<BookingOutcome, AppointmentError> {
        let patient = self.resolve_patient(user, request.for_family_member_id, auth_token).await?;
        let doctor = self.resolve_doctor(&request, auth_token).await?;

        if !doctor.is_available {
            return Err(AppointmentError::DoctorUnavailable);
        }

        if self.slot_taken(doctor.id, request.hospital_id, request.date, request.time, auth_token).await? {
            return Err(AppointmentError::SlotTaken);
        }

        let booked = self.active_count(doctor.id, request.hospital_id, request.date, auth_token).await?;
        let token_number = next_token_number(booked);

        let row = json!({
            "patient_id": patient.id,
            "doctor_id": doctor.id,
            "hospital_id": request.hospital_id,
            "date": request.date,
            "time": format_slot_time(&request.time),
            "reason": request.reason,
            "status": AppointmentStatus::Pending,
            "token_number": token_number,
        });

        let appointment: Appointment = self.supabase.insert("appointments", row, auth_token).await?;
        info!(
            "Appointment {} booked for patient {} with doctor {} (token {})",
            appointment.id, patient.id, doctor.id, token_number
        );

        let reminder = self.schedule_reminder(&patient, &appointment, auth_token).await;

        let ctx = MessageContext::new(
            Some(&patient.name),
            Some(&patient.patient_id),
            doctor.display_name(),
            appointment.date,
            appointment.time,
        );
        self.notifier.booking_created(&appointment, &ctx, auth_token).await?;

        Ok(BookingOutcome { appointment, reminder })
    }

    async fn resolve_patient(
        &self,
        user: &User,
        family_member_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Patient, AppointmentError> {
        let Some(member_id) = family_member_id else {
            return self.patients.get_by_user(&user.id, auth_token).await
                .map_err(|e| patient_error(e, AppointmentError::PatientNotFound));
        };

        let member = self.patients.get(member_id, auth_token).await
            .map_err(|e| patient_error(e, AppointmentError::FamilyMemberNotFound))?;

        self.patients.get_by_user(&user.id, auth_token).await
            .map_err(|e| patient_error(e, AppointmentError::PrimaryPatientNotFound))?;

        if member.user_id.to_string() != user.id {
            warn!("User {} tried to book for patient {} of another account", user.id, member_id);
            return Err(AppointmentError::FamilyMemberForbidden);
        }

        Ok(member)
    }

    async fn resolve_doctor(
        &self,
        request: &CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Doctor, AppointmentError> {
        match request.doctor_id {
            DoctorChoice::FirstAvailable => {
                let specialty = request.specialty
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or(AppointmentError::SpecialtyRequired)?;

                self.doctors
                    .first_available(request.hospital_id, specialty, auth_token)
                    .await
                    .map_err(|e| doctor_error(e, AppointmentError::NoDoctorAvailable))?
                    .ok_or(AppointmentError::NoDoctorAvailable)
            }
            DoctorChoice::Doctor(doctor_id) => self.doctors
                .get(doctor_id, auth_token)
                .await
                .map_err(|e| doctor_error(e, AppointmentError::DoctorNotFound)),
        }
    }

    async fn slot_taken(
        &self,
        doctor_id: Uuid,
        hospital_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&hospital_id=eq.{}&date=eq.{}&time=eq.{}&status=neq.Cancelled&select=id&limit=1",
            doctor_id, hospital_id, date, format_slot_time(&time)
        );
        let existing: Option<IdRow> = self.supabase.select_one(&path, auth_token).await?;
        if let Some(row) = &existing {
            debug!("Slot held by appointment {}", row.id);
        }
        Ok(existing.is_some())
    }

    /// Non-cancelled bookings for the doctor at the hospital on `date`.
    async fn active_count(
        &self,
        doctor_id: Uuid,
        hospital_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<usize, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&hospital_id=eq.{}&date=eq.{}&status=neq.Cancelled&select=id",
            doctor_id, hospital_id, date
        );
        let rows: Vec<IdRow> = self.supabase.select(&path, auth_token).await?;
        Ok(rows.len())
    }

    /// Voice call to the patient's account holder shortly before the visit.
    /// Lookup failures only cost the reminder, never the booking.
    async fn schedule_reminder(
        &self,
        patient: &Patient,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Option<JoinHandle<()>> {
        let at = appointment_instant(appointment.date, appointment.time)?;
        let delay = ReminderScheduler::reminder_delay(at, Utc::now(), self.reminder_lead)?;

        let path = format!(
            "/rest/v1/users?id=eq.{}&select=name,phone_number,profile_picture",
            patient.user_id
        );
        let contact: Option<PartyUser> = match self.supabase.select_one(&path, auth_token).await {
            Ok(contact) => contact,
            Err(e) => {
                warn!("Reminder for appointment {} skipped: user lookup failed: {}", appointment.id, e);
                return None;
            }
        };

        let phone = contact
            .and_then(|c| c.phone_number)
            .filter(|p| !p.trim().is_empty())?;

        Some(self.reminders.schedule_call(phone, self.recorded_call_url.clone(), delay))
    }

    // ==========================================================================
    // UPDATE / DELETE
    // ==========================================================================

    pub async fn update(
        &self,
        appointment_id: Uuid,
        user: &User,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<UpdateOutcome, AppointmentError> {
        let existing = self.get_by_id(appointment_id, auth_token).await?;
        Self::authorize(&existing, user, "update")?;

        let old_status = existing.status;
        let changes = update_changes(&request);

        let rows: Vec<Appointment> = self.supabase.update(
            "appointments",
            &format!("id=eq.{}", appointment_id),
            changes,
            auth_token,
        ).await?;

        let mut updated = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        updated.patient = existing.patient;
        updated.doctor = existing.doctor;
        updated.hospital = existing.hospital;

        let mut sms_tasks = Vec::new();
        if let Some(status) = request.status.filter(|s| *s != old_status) {
            info!("Appointment {} moved from {} to {}", appointment_id, old_status, status);
            sms_tasks = self.notifier.status_changed(&updated, status, auth_token).await?;
        }

        Ok(UpdateOutcome { appointment: updated, sms_tasks })
    }

    pub async fn delete(&self, appointment_id: Uuid, auth_token: &str) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&select=id", appointment_id);
        let existing: Option<IdRow> = self.supabase.select_one(&path, auth_token).await?;
        if existing.is_none() {
            return Err(AppointmentError::NotFound);
        }

        self.supabase
            .delete("appointments", &format!("id=eq.{}", appointment_id), auth_token)
            .await?;
        info!("Appointment {} removed", appointment_id);
        Ok(())
    }
}

/// Token numbers count up per doctor, hospital and day.
pub fn next_token_number(active_bookings: usize) -> i32 {
    i32::try_from(active_bookings).map_or(i32::MAX, |n| n.saturating_add(1))
}

/// Appointment wall-clock time read in the server's local zone.
pub fn appointment_instant(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn update_changes(request: &UpdateAppointmentRequest) -> Value {
    let mut changes = Map::new();
    if let Some(date) = request.date {
        changes.insert("date".to_string(), json!(date));
    }
    if let Some(time) = request.time {
        changes.insert("time".to_string(), json!(format_slot_time(&time)));
    }
    if let Some(reason) = request.reason.as_deref().filter(|r| !r.trim().is_empty()) {
        changes.insert("reason".to_string(), json!(reason));
    }
    if let Some(status) = request.status {
        changes.insert("status".to_string(), json!(status));
    }
    if let Some(token_number) = request.token_number.filter(|n| *n > 0) {
        changes.insert("token_number".to_string(), json!(token_number));
    }
    changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    Value::Object(changes)
}

fn patient_error(err: PatientError, not_found: AppointmentError) -> AppointmentError {
    match err {
        PatientError::NotFound | PatientError::FamilyMemberNotFound => not_found,
        other => AppointmentError::DatabaseError(other.to_string()),
    }
}

fn doctor_error(err: DoctorError, not_found: AppointmentError) -> AppointmentError {
    match err {
        DoctorError::NotFound | DoctorError::ProfileNotFound => not_found,
        other => AppointmentError::DatabaseError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_numbers_start_at_one() {
        assert_eq!(next_token_number(0), 1);
        assert_eq!(next_token_number(7), 8);
        assert_eq!(next_token_number(usize::MAX), i32::MAX);
    }

    #[test]
    fn test_update_changes_keep_absent_fields() {
        let request = UpdateAppointmentRequest {
            status: Some(AppointmentStatus::Confirmed),
            reason: Some("  ".to_string()),
            ..Default::default()
        };
        let changes = update_changes(&request);

        assert_eq!(changes["status"], "Confirmed");
        assert!(changes.get("reason").is_none());
        assert!(changes.get("date").is_none());
        assert!(changes.get("time").is_none());
        assert!(changes.get("updated_at").is_some());
    }

    #[test]
    fn test_update_changes_format_time() {
        let request = UpdateAppointmentRequest {
            time: NaiveTime::from_hms_opt(14, 0, 0),
            token_number: Some(3),
            ..Default::default()
        };
        let changes = update_changes(&request);

        assert_eq!(changes["time"], "14:00");
        assert_eq!(changes["token_number"], 3);
    }

    #[test]
    fn test_appointment_instant_round_trips_local_time() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let instant = appointment_instant(date, time).unwrap();

        assert_eq!(instant.with_timezone(&Local).naive_local(), date.and_time(time));
    }

    #[test]
    fn test_out_of_range_reminder_lead_falls_back() {
        let mut config = shared_utils::test_utils::TestConfig::default().to_app_config();
        config.reminder_lead_minutes = i64::MAX / 10;
        let service = AppointmentBookingService::new(&config);
        assert_eq!(service.reminder_lead, chrono::Duration::minutes(shared_config::DEFAULT_REMINDER_LEAD_MINUTES));

        config.reminder_lead_minutes = -30;
        let service = AppointmentBookingService::new(&config);
        assert_eq!(service.reminder_lead, chrono::Duration::minutes(shared_config::DEFAULT_REMINDER_LEAD_MINUTES));
    }
}
