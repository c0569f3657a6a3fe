use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AddStaffRequest, Shop, ShopError, ShopStaff, UpdateShopProfileRequest};

pub struct ShopService {
    supabase: SupabaseClient,
}

impl ShopService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_by_user(&self, user_id: &str, auth_token: &str) -> Result<Shop, ShopError> {
        let path = format!("/rest/v1/shops?user_id=eq.{}", user_id);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(ShopError::ProfileNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateShopProfileRequest,
        auth_token: &str,
    ) -> Result<Shop, ShopError> {
        let shop = self.get_by_user(user_id, auth_token).await?;
        let changes = profile_changes(request)?;

        let updated: Vec<Shop> = self.supabase.update(
            "shops",
            &format!("id=eq.{}", shop.id),
            changes,
            auth_token,
        ).await?;

        info!("Shop profile {} updated", shop.id);
        updated.into_iter().next().ok_or(ShopError::ProfileNotFound)
    }

    // ==========================================================================
    // STAFF
    // ==========================================================================

    pub async fn list_staff(&self, user_id: &str, auth_token: &str) -> Result<Vec<ShopStaff>, ShopError> {
        let shop = self.get_by_user(user_id, auth_token).await?;
        let path = format!("/rest/v1/shop_staff?shop_id=eq.{}&order=created_at.asc", shop.id);
        Ok(self.supabase.select(&path, auth_token).await?)
    }

    pub async fn add_staff(
        &self,
        user_id: &str,
        request: AddStaffRequest,
        auth_token: &str,
    ) -> Result<ShopStaff, ShopError> {
        let name = request.name.trim();
        let Some(role) = request.role.filter(|_| !name.is_empty()) else {
            return Err(ShopError::ValidationError("Staff name and role are required".to_string()));
        };

        let shop = self.get_by_user(user_id, auth_token).await?;
        let row = json!({
            "shop_id": shop.id,
            "name": name,
            "role": role,
            "email": request.email,
            "phone": request.phone,
        });

        let staff: ShopStaff = self.supabase.insert("shop_staff", row, auth_token).await?;
        info!("Added {} {} to shop {}", staff.role, staff.id, shop.id);
        Ok(staff)
    }

    pub async fn remove_staff(&self, user_id: &str, staff_id: Uuid, auth_token: &str) -> Result<(), ShopError> {
        let shop = self.get_by_user(user_id, auth_token).await?;

        let path = format!("/rest/v1/shop_staff?id=eq.{}", staff_id);
        let staff: ShopStaff = self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(ShopError::StaffNotFound)?;

        if staff.shop_id != shop.id {
            debug!("Staff {} is registered to shop {}, not {}", staff.id, staff.shop_id, shop.id);
            return Err(ShopError::StaffOfOtherShop);
        }

        self.supabase
            .delete("shop_staff", &format!("id=eq.{}", staff_id), auth_token)
            .await?;
        info!("Removed staff {} from shop {}", staff_id, shop.id);
        Ok(())
    }
}

fn profile_changes(request: UpdateShopProfileRequest) -> Result<Value, ShopError> {
    let mut changes = Map::new();

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(ShopError::ValidationError("Shop name cannot be empty".to_string()));
        }
        changes.insert("name".to_string(), json!(name.trim()));
    }
    let optional = [
        ("license_number", request.license_number),
        ("address", request.address),
        ("phone", request.phone),
        ("email", request.email),
        ("plan", request.plan),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            changes.insert(field.to_string(), json!(value));
        }
    }
    changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

    Ok(Value::Object(changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_profile_changes() {
        let request = UpdateShopProfileRequest {
            plan: Some("premium".to_string()),
            ..Default::default()
        };
        let changes = profile_changes(request).unwrap();

        assert_eq!(changes["plan"], "premium");
        assert!(changes.get("address").is_none());
    }

    #[test]
    fn test_blank_name_rejected() {
        let request = UpdateShopProfileRequest {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert_matches!(profile_changes(request), Err(ShopError::ValidationError(_)));
    }
}
