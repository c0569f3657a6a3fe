use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::account::UserAccount;

use crate::models::{
    AdminError, UpdateUserRequest, UpdateUserStatusRequest, UserListQuery, UserPage, USERS_PER_PAGE,
};

pub struct UserAdminService {
    supabase: SupabaseClient,
}

impl UserAdminService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list(&self, query: &UserListQuery, auth_token: &str) -> Result<UserPage, AdminError> {
        let path = list_path(query);
        debug!("Listing users: {}", path);

        let users: Vec<UserAccount> = self.supabase.select(&path, auth_token).await?;
        Ok(UserPage {
            users,
            page: query.page(),
            per_page: USERS_PER_PAGE,
        })
    }

    pub async fn get(&self, user_id: Uuid, auth_token: &str) -> Result<UserAccount, AdminError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(AdminError::UserNotFound)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
        auth_token: &str,
    ) -> Result<UserAccount, AdminError> {
        let changes = user_changes(request)?;
        self.get(user_id, auth_token).await?;

        let updated: Vec<UserAccount> = self.supabase.update(
            "users",
            &format!("id=eq.{}", user_id),
            changes,
            auth_token,
        ).await?;

        info!("User {} updated by admin", user_id);
        updated.into_iter().next().ok_or(AdminError::UserNotFound)
    }

    /// Sets the requested status, or flips the current one when none is given.
    pub async fn set_status(
        &self,
        user_id: Uuid,
        request: UpdateUserStatusRequest,
        auth_token: &str,
    ) -> Result<UserAccount, AdminError> {
        let current = self.get(user_id, auth_token).await?;
        let status = request.status.unwrap_or_else(|| current.status.toggled());

        let updated: Vec<UserAccount> = self.supabase.update(
            "users",
            &format!("id=eq.{}", user_id),
            json!({ "status": status }),
            auth_token,
        ).await?;

        info!("User {} status {} -> {}", user_id, current.status, status);
        updated.into_iter().next().ok_or(AdminError::UserNotFound)
    }

    pub async fn delete(&self, user_id: Uuid, auth_token: &str) -> Result<(), AdminError> {
        self.get(user_id, auth_token).await?;
        self.supabase
            .delete("users", &format!("id=eq.{}", user_id), auth_token)
            .await?;
        info!("User {} deleted", user_id);
        Ok(())
    }
}

fn list_path(query: &UserListQuery) -> String {
    let mut path = String::from("/rest/v1/users?order=created_at.desc");

    if let Some(role) = query.role {
        path.push_str(&format!("&role=eq.{}", role));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        path.push_str(&format!("&name=ilike.*{}*", urlencoding::encode(search)));
    }

    let offset = (query.page() - 1).saturating_mul(USERS_PER_PAGE);
    path.push_str(&format!("&limit={}&offset={}", USERS_PER_PAGE, offset));
    path
}

fn user_changes(request: UpdateUserRequest) -> Result<Value, AdminError> {
    let mut changes = Map::new();

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(AdminError::ValidationError("Name cannot be empty".to_string()));
        }
        changes.insert("name".to_string(), json!(name.trim()));
    }
    if let Some(email) = request.email {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AdminError::ValidationError("Invalid email address".to_string()));
        }
        changes.insert("email".to_string(), json!(email));
    }
    if let Some(role) = request.role {
        changes.insert("role".to_string(), json!(role));
    }
    if let Some(phone) = request.phone_number {
        changes.insert("phone_number".to_string(), json!(phone));
    }

    if changes.is_empty() {
        return Err(AdminError::ValidationError("No fields to update".to_string()));
    }
    Ok(Value::Object(changes))
}
