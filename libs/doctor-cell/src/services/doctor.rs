use std::collections::HashMap;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Doctor, DoctorError, DoctorPatientSummary, DoctorQuery, PatientVisit,
    UpdateDoctorProfileRequest, DOCTOR_SELECT,
};

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Directory listing, optionally narrowed by hospital, specialty and availability.
    pub async fn list(&self, query: &DoctorQuery, auth_token: &str) -> Result<Vec<Doctor>, DoctorError> {
        let path = filter_path(query);
        debug!("Listing doctors: {}", path);
        Ok(self.supabase.select(&path, auth_token).await?)
    }

    pub async fn get(&self, doctor_id: Uuid, auth_token: &str) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select={}", doctor_id, DOCTOR_SELECT);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    /// Doctor record belonging to a platform user.
    pub async fn get_by_user(&self, user_id: &str, auth_token: &str) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?user_id=eq.{}&select={}", user_id, DOCTOR_SELECT);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(DoctorError::ProfileNotFound)
    }

    /// First available doctor of `specialty` at `hospital_id`, oldest record first.
    pub async fn first_available(
        &self,
        hospital_id: Uuid,
        specialty: &str,
        auth_token: &str,
    ) -> Result<Option<Doctor>, DoctorError> {
        let query = DoctorQuery {
            hospital_id: Some(hospital_id),
            specialty: Some(specialty.to_string()),
            available: Some(true),
        };
        let path = format!("{}&limit=1", filter_path(&query));

        debug!("Looking up first available {} doctor at hospital {}", specialty, hospital_id);
        Ok(self.supabase.select_one(&path, auth_token).await?)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateDoctorProfileRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let doctor = self.get_by_user(user_id, auth_token).await?;
        let changes = profile_changes(&doctor, request)?;

        let updated: Vec<Doctor> = self.supabase.update(
            "doctors",
            &format!("id=eq.{}", doctor.id),
            changes,
            auth_token,
        ).await?;

        info!("Doctor profile {} updated", doctor.id);
        // PATCH returns the bare row; read again for the embedded user
        match updated.into_iter().next() {
            Some(_) => self.get(doctor.id, auth_token).await,
            None => Err(DoctorError::ProfileNotFound),
        }
    }

    /// Distinct patients seen by the calling doctor.
    pub async fn my_patients(&self, user_id: &str, auth_token: &str) -> Result<Vec<DoctorPatientSummary>, DoctorError> {
        let doctor = self.get_by_user(user_id, auth_token).await?;
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=neq.Cancelled&select=patient_id,date,patient:patients(id,patient_id,name,gender,dob,blood_group)&order=date.desc",
            doctor.id
        );
        let visits: Vec<PatientVisit> = self.supabase.select(&path, auth_token).await?;
        Ok(summarize_visits(visits))
    }
}

fn filter_path(query: &DoctorQuery) -> String {
    let mut path = format!("/rest/v1/doctors?select={}", DOCTOR_SELECT);
    if let Some(hospital_id) = query.hospital_id {
        path.push_str(&format!("&hospital_id=eq.{}", hospital_id));
    }
    if let Some(specialty) = &query.specialty {
        path.push_str(&format!("&specialty=eq.{}", urlencoding::encode(specialty)));
    }
    if let Some(available) = query.available {
        path.push_str(&format!("&is_available=eq.{}", available));
    }
    path.push_str("&order=created_at.asc");
    path
}

/// Build the PATCH body, checking hours and slot length against the stored record.
fn profile_changes(doctor: &Doctor, request: UpdateDoctorProfileRequest) -> Result<Value, DoctorError> {
    let start = request.consultation_start.unwrap_or(doctor.consultation_start);
    let end = request.consultation_end.unwrap_or(doctor.consultation_end);
    if start >= end {
        return Err(DoctorError::ValidationError(
            "Consultation start must be before consultation end".to_string(),
        ));
    }

    let mut changes = Map::new();
    if let Some(specialty) = request.specialty {
        if specialty.trim().is_empty() {
            return Err(DoctorError::ValidationError("Specialty cannot be empty".to_string()));
        }
        changes.insert("specialty".to_string(), json!(specialty.trim()));
    }
    if let Some(qualifications) = request.qualifications {
        changes.insert("qualifications".to_string(), json!(qualifications));
    }
    if let Some(is_available) = request.is_available {
        changes.insert("is_available".to_string(), json!(is_available));
    }
    if request.consultation_start.is_some() {
        changes.insert("consultation_start".to_string(), json!(start.format("%H:%M").to_string()));
    }
    if request.consultation_end.is_some() {
        changes.insert("consultation_end".to_string(), json!(end.format("%H:%M").to_string()));
    }
    if let Some(minutes) = request.slot_duration_minutes {
        if minutes <= 0 {
            return Err(DoctorError::ValidationError("Slot duration must be positive".to_string()));
        }
        changes.insert("slot_duration_minutes".to_string(), json!(minutes));
    }
    if let Some(days) = request.working_days {
        let days: Vec<String> = days.iter().map(|d| d.to_string()).collect();
        changes.insert("working_days".to_string(), json!(days));
    }
    changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

    Ok(Value::Object(changes))
}

/// Collapse visits (newest first) into one row per patient.
fn summarize_visits(visits: Vec<PatientVisit>) -> Vec<DoctorPatientSummary> {
    let mut order = Vec::new();
    let mut by_patient: HashMap<Uuid, DoctorPatientSummary> = HashMap::new();

    for visit in visits {
        match by_patient.get_mut(&visit.patient_id) {
            Some(summary) => {
                summary.appointment_count += 1;
                if visit.date > summary.last_visit {
                    summary.last_visit = visit.date;
                }
            }
            None => {
                order.push(visit.patient_id);
                by_patient.insert(visit.patient_id, DoctorPatientSummary {
                    patient_id: visit.patient_id,
                    patient: visit.patient,
                    appointment_count: 1,
                    last_visit: visit.date,
                });
            }
        }
    }

    order.into_iter().filter_map(|id| by_patient.remove(&id)).collect()
}
