use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use notification_cell::{NewNotification, NotificationCategory, NotificationService, RecipientModel};
use patient_cell::{PatientError, PatientService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    CreateLabOrderRequest, LabError, LabOrderStatus, LabTestOrder, UpdateOrderStatusRequest,
};
use crate::services::lab::LabService;

const ORDER_SELECT: &str = "*,lab:labs(name,lab_id,phone),patient:patients(name,patient_id)";

pub struct LabOrderService {
    supabase: SupabaseClient,
    labs: LabService,
    patients: PatientService,
    notifications: NotificationService,
}

impl LabOrderService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            labs: LabService::new(config),
            patients: PatientService::new(config),
            notifications: NotificationService::new(config),
        }
    }

    pub async fn create_order(
        &self,
        user: &User,
        request: CreateLabOrderRequest,
        auth_token: &str,
    ) -> Result<LabTestOrder, LabError> {
        let patient = self.patients
            .get_by_user(&user.id, auth_token)
            .await
            .map_err(patient_error)?;
        let lab = self.labs.get(request.lab_id, auth_token).await?;

        let test = lab
            .find_test(&request.test_name)
            .ok_or_else(|| LabError::TestNotOffered(request.test_name.trim().to_string()))?;

        if let Some(quoted) = request.price.filter(|p| (p - test.price).abs() > f64::EPSILON) {
            debug!("Ignoring client price {} for '{}', catalogue says {}", quoted, test.test_name, test.price);
        }

        let row = json!({
            "patient_id": patient.id,
            "lab_id": lab.id,
            "test_name": test.test_name,
            "test_type": test.test_type.clone().or(request.test_type),
            "price": test.price,
            "order_date": request.order_date.to_rfc3339(),
            "status": LabOrderStatus::Ordered,
        });

        let order: LabTestOrder = self.supabase.insert("lab_test_orders", row, auth_token).await?;
        info!("Lab order {} placed by patient {} at lab {}", order.id, patient.id, lab.id);

        self.notifications.create(NewNotification {
            recipient_id: lab.id,
            on_model: RecipientModel::Lab,
            title: "New Lab Test Order".to_string(),
            message: format!(
                "{} (ID: {}) ordered {} for {}.",
                patient.name,
                patient.patient_id,
                order.test_name,
                order.order_date.format("%a %b %d %Y")
            ),
            category: NotificationCategory::LabTest,
            link: Some("/lab/orders".to_string()),
        }, auth_token).await?;

        Ok(order)
    }

    /// Orders placed by the calling patient.
    pub async fn my_orders(&self, user: &User, auth_token: &str) -> Result<Vec<LabTestOrder>, LabError> {
        let patient = self.patients
            .get_by_user(&user.id, auth_token)
            .await
            .map_err(patient_error)?;

        let path = format!(
            "/rest/v1/lab_test_orders?patient_id=eq.{}&select={}&order=order_date.desc",
            patient.id, ORDER_SELECT
        );
        Ok(self.supabase.select(&path, auth_token).await?)
    }

    /// Orders received by the calling lab.
    pub async fn lab_orders(&self, user: &User, auth_token: &str) -> Result<Vec<LabTestOrder>, LabError> {
        let lab = self.labs.get_by_user(&user.id, auth_token).await?;

        let path = format!(
            "/rest/v1/lab_test_orders?lab_id=eq.{}&select={}&order=order_date.desc",
            lab.id, ORDER_SELECT
        );
        let orders: Vec<LabTestOrder> = self.supabase.select(&path, auth_token).await?;
        debug!("Lab {} has {} orders", lab.id, orders.len());
        Ok(orders)
    }

    pub async fn update_status(
        &self,
        order_id: Uuid,
        user: &User,
        request: UpdateOrderStatusRequest,
        auth_token: &str,
    ) -> Result<LabTestOrder, LabError> {
        let lab = self.labs.get_by_user(&user.id, auth_token).await?;

        let path = format!("/rest/v1/lab_test_orders?id=eq.{}", order_id);
        let existing: LabTestOrder = self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(LabError::OrderNotFound)?;

        if existing.lab_id != lab.id {
            return Err(LabError::Forbidden("update orders of another lab"));
        }

        let updated: Vec<LabTestOrder> = self.supabase.update(
            "lab_test_orders",
            &format!("id=eq.{}", order_id),
            status_changes(&request),
            auth_token,
        ).await?;
        let order = updated.into_iter().next().ok_or(LabError::OrderNotFound)?;

        info!("Lab order {} moved from {} to {}", order.id, existing.status, order.status);

        let mut message = format!(
            "Your {} test at {} is now {}.",
            order.test_name, lab.name, order.status
        );
        if order.report_url.is_some() {
            message.push_str(" Your report is ready to view.");
        }

        self.notifications.create(NewNotification {
            recipient_id: order.patient_id,
            on_model: RecipientModel::Patient,
            title: "Lab Test Update".to_string(),
            message,
            category: NotificationCategory::LabTest,
            link: Some("/patient/lab-tests".to_string()),
        }, auth_token).await?;

        Ok(order)
    }
}

fn status_changes(request: &UpdateOrderStatusRequest) -> Value {
    let mut changes = Map::new();
    changes.insert("status".to_string(), json!(request.status));
    if let Some(url) = request.report_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        changes.insert("report_url".to_string(), json!(url));
    }
    changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    Value::Object(changes)
}

fn patient_error(err: PatientError) -> LabError {
    match err {
        PatientError::NotFound | PatientError::FamilyMemberNotFound => LabError::PatientNotFound,
        other => LabError::DatabaseError(other.to_string()),
    }
}
