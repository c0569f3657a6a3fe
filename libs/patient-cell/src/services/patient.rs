use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AddFamilyMemberRequest, Patient, PatientError, UpdatePatientRequest};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// The caller's own patient record (family members excluded).
    pub async fn get_by_user(&self, user_id: &str, auth_token: &str) -> Result<Patient, PatientError> {
        let path = format!(
            "/rest/v1/patients?user_id=eq.{}&primary_patient_id=is.null",
            user_id
        );
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(PatientError::NotFound)
    }

    pub async fn get(&self, patient_id: Uuid, auth_token: &str) -> Result<Patient, PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(PatientError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        if request.is_empty() {
            return Err(PatientError::ValidationError("No profile fields to update".to_string()));
        }
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(PatientError::ValidationError("Name cannot be empty".to_string()));
            }
        }

        let patient = self.get_by_user(user_id, auth_token).await?;
        debug!("Updating patient profile {}", patient.id);

        let mut changes = Map::new();
        if let Some(name) = request.name {
            changes.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(dob) = request.dob {
            changes.insert("dob".to_string(), json!(dob));
        }
        if let Some(gender) = request.gender {
            changes.insert("gender".to_string(), json!(gender));
        }
        if let Some(blood_group) = request.blood_group {
            changes.insert("blood_group".to_string(), json!(blood_group));
        }
        if let Some(picture) = request.profile_picture {
            changes.insert("profile_picture".to_string(), json!(picture));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated: Vec<Patient> = self.supabase.update(
            "patients",
            &format!("id=eq.{}", patient.id),
            Value::Object(changes),
            auth_token,
        ).await?;

        updated.into_iter().next().ok_or(PatientError::NotFound)
    }

    /// Records booked under the caller's account, other than their own.
    pub async fn list_family_members(&self, user_id: &str, auth_token: &str) -> Result<Vec<Patient>, PatientError> {
        let primary = self.get_by_user(user_id, auth_token).await?;
        let path = format!(
            "/rest/v1/patients?primary_patient_id=eq.{}&order=created_at.asc",
            primary.id
        );
        Ok(self.supabase.select(&path, auth_token).await?)
    }

    /// Resolve a family member and check it belongs to `primary`.
    pub async fn get_family_member(
        &self,
        primary: &Patient,
        member_id: Uuid,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        let member = self.get(member_id, auth_token).await.map_err(|e| match e {
            PatientError::NotFound => PatientError::FamilyMemberNotFound,
            other => other,
        })?;

        if member.primary_patient_id != Some(primary.id) {
            warn!("Patient {} is not a family member of {}", member_id, primary.id);
            return Err(PatientError::FamilyMemberNotFound);
        }
        Ok(member)
    }

    pub async fn add_family_member(
        &self,
        user_id: &str,
        request: AddFamilyMemberRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        if request.name.trim().is_empty() {
            return Err(PatientError::ValidationError("Name is required".to_string()));
        }
        if request.relationship.trim().is_empty() {
            return Err(PatientError::ValidationError("Relationship is required".to_string()));
        }

        let primary = self.get_by_user(user_id, auth_token).await?;

        let row = json!({
            "user_id": primary.user_id,
            "patient_id": generate_patient_code(),
            "name": request.name.trim(),
            "dob": request.dob,
            "gender": request.gender,
            "blood_group": request.blood_group,
            "is_premium": false,
            "primary_patient_id": primary.id,
            "relationship": request.relationship.trim(),
        });

        let member: Patient = self.supabase.insert("patients", row, auth_token).await?;
        info!("Added family member {} for patient {}", member.id, primary.id);
        Ok(member)
    }

    pub async fn remove_family_member(
        &self,
        user_id: &str,
        member_id: Uuid,
        auth_token: &str,
    ) -> Result<(), PatientError> {
        let primary = self.get_by_user(user_id, auth_token).await?;
        let member = self.get_family_member(&primary, member_id, auth_token).await?;

        self.supabase
            .delete("patients", &format!("id=eq.{}", member.id), auth_token)
            .await?;
        info!("Removed family member {} from patient {}", member.id, primary.id);
        Ok(())
    }
}

/// `PAT-` followed by eight upper-case hex characters.
pub fn generate_patient_code() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("PAT-{}", simple[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_code_shape() {
        let code = generate_patient_code();
        assert!(code.starts_with("PAT-"));
        assert_eq!(code.len(), 12);
        assert!(code[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
