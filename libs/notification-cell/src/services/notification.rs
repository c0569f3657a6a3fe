// libs/notification-cell/src/services/notification.rs
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Role, User};

use crate::models::{
    NewNotification, Notification, NotificationError, NotificationQuery, Recipient, RecipientModel,
};

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

pub struct NotificationService {
    supabase: SupabaseClient,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create(
        &self,
        notification: NewNotification,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        debug!("Creating {} notification for {} {}", notification.title, notification.on_model, notification.recipient_id);

        let row = json!({
            "recipient_id": notification.recipient_id,
            "on_model": notification.on_model,
            "title": notification.title,
            "message": notification.message,
            "category": notification.category,
            "link": notification.link,
            "is_read": false,
        });

        let created: Notification = self.supabase.insert("notifications", row, auth_token).await?;
        Ok(created)
    }

    /// Feed for one recipient, newest first.
    pub async fn list_for_recipient(
        &self,
        recipient: Recipient,
        query: &NotificationQuery,
        auth_token: &str,
    ) -> Result<Vec<Notification>, NotificationError> {
        let mut path = format!(
            "/rest/v1/notifications?recipient_id=eq.{}&on_model=eq.{}&order=created_at.desc",
            recipient.id, recipient.model
        );
        if query.unread_only.unwrap_or(false) {
            path.push_str("&is_read=eq.false");
        }
        if let Some(limit) = query.limit {
            path.push_str(&format!("&limit={}", limit));
        }

        Ok(self.supabase.select(&path, auth_token).await?)
    }

    pub async fn unread_count(
        &self,
        recipient: Recipient,
        auth_token: &str,
    ) -> Result<usize, NotificationError> {
        let path = format!(
            "/rest/v1/notifications?recipient_id=eq.{}&on_model=eq.{}&is_read=eq.false&select=id",
            recipient.id, recipient.model
        );
        let rows: Vec<IdRow> = self.supabase.select(&path, auth_token).await?;
        Ok(rows.len())
    }

    pub async fn get(&self, notification_id: Uuid, auth_token: &str) -> Result<Notification, NotificationError> {
        let path = format!("/rest/v1/notifications?id=eq.{}", notification_id);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(NotificationError::NotFound)
    }

    /// Mark one notification read; only its recipient may do so.
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        recipient: Recipient,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        let existing = self.get(notification_id, auth_token).await?;
        ensure_owner(&existing, recipient)?;

        let updated: Vec<Notification> = self.supabase.update(
            "notifications",
            &format!("id=eq.{}", notification_id),
            json!({ "is_read": true }),
            auth_token,
        ).await?;

        updated.into_iter().next().ok_or(NotificationError::NotFound)
    }

    pub async fn mark_all_read(
        &self,
        recipient: Recipient,
        auth_token: &str,
    ) -> Result<usize, NotificationError> {
        let filter = format!(
            "recipient_id=eq.{}&on_model=eq.{}&is_read=eq.false",
            recipient.id, recipient.model
        );
        let updated: Vec<Notification> = self.supabase.update(
            "notifications",
            &filter,
            json!({ "is_read": true }),
            auth_token,
        ).await?;

        info!("Marked {} notifications read for {} {}", updated.len(), recipient.model, recipient.id);
        Ok(updated.len())
    }

    pub async fn delete(
        &self,
        notification_id: Uuid,
        recipient: Recipient,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        let existing = self.get(notification_id, auth_token).await?;
        ensure_owner(&existing, recipient)?;

        self.supabase
            .delete("notifications", &format!("id=eq.{}", notification_id), auth_token)
            .await?;
        Ok(())
    }

    /// Work out whose feed the caller reads: the profile record for
    /// patients, doctors, labs and shops, the user itself for admins.
    pub async fn resolve_recipient(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Recipient, NotificationError> {
        let model = match user.platform_role() {
            Some(Role::Patient) => RecipientModel::Patient,
            Some(Role::Doctor) => RecipientModel::Doctor,
            Some(Role::Lab) => RecipientModel::Lab,
            Some(Role::Shop) => RecipientModel::Shop,
            Some(Role::Admin) => RecipientModel::Admin,
            None => return Err(NotificationError::UnsupportedRole),
        };

        let Some(table) = model.profile_table() else {
            let id = Uuid::parse_str(&user.id).map_err(|_| NotificationError::UnsupportedRole)?;
            return Ok(Recipient { id, model });
        };

        // Patients may own family-member records too; the primary one has no primary_patient_id.
        let mut path = format!("/rest/v1/{}?user_id=eq.{}&select=id", table, user.id);
        if model == RecipientModel::Patient {
            path.push_str("&primary_patient_id=is.null");
        }

        let row: Option<IdRow> = self.supabase.select_one(&path, auth_token).await?;
        row.map(|r| Recipient { id: r.id, model })
            .ok_or(NotificationError::RecipientNotFound(model))
    }
}

fn ensure_owner(notification: &Notification, recipient: Recipient) -> Result<(), NotificationError> {
    if notification.recipient_id == recipient.id && notification.on_model == recipient.model {
        Ok(())
    } else {
        Err(NotificationError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::NotificationCategory;

    fn notification(recipient_id: Uuid, model: RecipientModel) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id,
            on_model: model,
            title: "t".to_string(),
            message: "m".to_string(),
            category: NotificationCategory::System,
            link: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_owner_checks_id_and_model() {
        let id = Uuid::new_v4();
        let n = notification(id, RecipientModel::Doctor);

        assert!(ensure_owner(&n, Recipient { id, model: RecipientModel::Doctor }).is_ok());
        assert!(ensure_owner(&n, Recipient { id, model: RecipientModel::Patient }).is_err());
        assert!(ensure_owner(&n, Recipient { id: Uuid::new_v4(), model: RecipientModel::Doctor }).is_err());
    }
}
