use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AdminError, CreateHospitalRequest, Hospital, UpdateHospitalRequest};

pub struct HospitalService {
    supabase: SupabaseClient,
}

impl HospitalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list(&self, auth_token: &str) -> Result<Vec<Hospital>, AdminError> {
        Ok(self.supabase.select("/rest/v1/hospitals?order=name.asc", auth_token).await?)
    }

    pub async fn create(&self, request: CreateHospitalRequest, auth_token: &str) -> Result<Hospital, AdminError> {
        let (name, location) = (request.name.trim(), request.location.trim());
        if name.is_empty() || location.is_empty() {
            return Err(AdminError::ValidationError("Hospital name and location are required".to_string()));
        }

        let row = json!({
            "name": name,
            "location": location,
            "phone": request.phone,
        });
        let hospital: Hospital = self.supabase.insert("hospitals", row, auth_token).await?;
        info!("Hospital {} ({}) created", hospital.id, hospital.name);
        Ok(hospital)
    }

    pub async fn update(
        &self,
        hospital_id: Uuid,
        request: UpdateHospitalRequest,
        auth_token: &str,
    ) -> Result<Hospital, AdminError> {
        let changes = hospital_changes(request)?;

        let updated: Vec<Hospital> = self.supabase.update(
            "hospitals",
            &format!("id=eq.{}", hospital_id),
            changes,
            auth_token,
        ).await?;

        // PATCH on a missing id matches no rows
        let hospital = updated.into_iter().next().ok_or(AdminError::HospitalNotFound)?;
        info!("Hospital {} updated", hospital.id);
        Ok(hospital)
    }

    pub async fn delete(&self, hospital_id: Uuid, auth_token: &str) -> Result<(), AdminError> {
        let path = format!("/rest/v1/hospitals?id=eq.{}", hospital_id);
        let existing: Option<Hospital> = self.supabase.select_one(&path, auth_token).await?;
        if existing.is_none() {
            return Err(AdminError::HospitalNotFound);
        }

        self.supabase
            .delete("hospitals", &format!("id=eq.{}", hospital_id), auth_token)
            .await?;
        info!("Hospital {} deleted", hospital_id);
        Ok(())
    }
}

fn hospital_changes(request: UpdateHospitalRequest) -> Result<Value, AdminError> {
    let mut changes = Map::new();
    for (field, value) in [("name", request.name), ("location", request.location)] {
        if let Some(value) = value {
            if value.trim().is_empty() {
                return Err(AdminError::ValidationError(format!("Hospital {} cannot be empty", field)));
            }
            changes.insert(field.to_string(), json!(value.trim()));
        }
    }
    if let Some(phone) = request.phone {
        changes.insert("phone".to_string(), json!(phone));
    }

    if changes.is_empty() {
        return Err(AdminError::ValidationError("No fields to update".to_string()));
    }
    Ok(Value::Object(changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_hospital_changes() {
        let request = UpdateHospitalRequest {
            location: Some(" Kochi ".to_string()),
            ..Default::default()
        };
        assert_eq!(hospital_changes(request).unwrap(), json!({ "location": "Kochi" }));

        let blank = UpdateHospitalRequest {
            name: Some("".to_string()),
            ..Default::default()
        };
        assert_matches!(hospital_changes(blank), Err(AdminError::ValidationError(msg)) if msg == "Hospital name cannot be empty");
    }
}
