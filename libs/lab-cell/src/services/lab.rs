use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{Lab, LabError, LabTest, UpdateLabProfileRequest};

pub struct LabService {
    supabase: SupabaseClient,
}

impl LabService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Labs a patient can book with: those offering at least one test.
    pub async fn available_labs(&self, auth_token: &str) -> Result<Vec<Lab>, LabError> {
        let labs: Vec<Lab> = self.supabase.select("/rest/v1/labs?order=name.asc", auth_token).await?;
        debug!("{} labs on record", labs.len());
        Ok(labs.into_iter().filter(|lab| !lab.tests_offered.is_empty()).collect())
    }

    pub async fn get(&self, lab_id: Uuid, auth_token: &str) -> Result<Lab, LabError> {
        let path = format!("/rest/v1/labs?id=eq.{}", lab_id);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(LabError::NotFound)
    }

    pub async fn get_by_user(&self, user_id: &str, auth_token: &str) -> Result<Lab, LabError> {
        let path = format!("/rest/v1/labs?user_id=eq.{}", user_id);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(LabError::ProfileNotFound)
    }

    pub async fn tests_for(&self, lab_id: Uuid, auth_token: &str) -> Result<Vec<LabTest>, LabError> {
        Ok(self.get(lab_id, auth_token).await?.tests_offered)
    }

    /// Profile read for the owning lab user or an admin.
    pub async fn get_profile(&self, lab_id: Uuid, user: &User, auth_token: &str) -> Result<Lab, LabError> {
        let lab = self.get(lab_id, auth_token).await?;
        ensure_manager(&lab, user, "view this lab profile")?;
        Ok(lab)
    }

    pub async fn update_profile(
        &self,
        lab_id: Uuid,
        user: &User,
        request: UpdateLabProfileRequest,
        auth_token: &str,
    ) -> Result<Lab, LabError> {
        let lab = self.get(lab_id, auth_token).await?;
        ensure_manager(&lab, user, "update this lab profile")?;

        let changes = profile_changes(request)?;
        let updated: Vec<Lab> = self.supabase.update(
            "labs",
            &format!("id=eq.{}", lab.id),
            changes,
            auth_token,
        ).await?;

        info!("Lab profile {} updated by {}", lab.id, user.id);
        updated.into_iter().next().ok_or(LabError::NotFound)
    }
}

fn ensure_manager(lab: &Lab, user: &User, action: &'static str) -> Result<(), LabError> {
    if user.is_admin() || lab.user_id.to_string() == user.id {
        Ok(())
    } else {
        Err(LabError::Forbidden(action))
    }
}

fn profile_changes(request: UpdateLabProfileRequest) -> Result<Value, LabError> {
    let mut changes = Map::new();

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(LabError::ValidationError("Lab name cannot be empty".to_string()));
        }
        changes.insert("name".to_string(), json!(name.trim()));
    }
    if let Some(address) = request.address {
        changes.insert("address".to_string(), json!(address));
    }
    if let Some(phone) = request.phone {
        changes.insert("phone".to_string(), json!(phone));
    }
    if let Some(email) = request.email {
        changes.insert("email".to_string(), json!(email));
    }
    if let Some(website) = request.website {
        changes.insert("website".to_string(), json!(website));
    }
    if let Some(tests) = request.tests_offered {
        validate_tests(&tests)?;
        changes.insert("tests_offered".to_string(), json!(tests));
    }
    changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

    Ok(Value::Object(changes))
}

fn validate_tests(tests: &[LabTest]) -> Result<(), LabError> {
    for test in tests {
        if test.test_name.trim().is_empty() {
            return Err(LabError::ValidationError("Test name is required".to_string()));
        }
        if test.price < 0.0 || !test.price.is_finite() {
            return Err(LabError::ValidationError(format!(
                "Price for '{}' must be zero or more",
                test.test_name
            )));
        }
    }
    Ok(())
}
