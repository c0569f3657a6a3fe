// libs/appointment-cell/src/services/notify.rs
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

use notification_cell::{
    DeliveryMode, Messenger, NewNotification, NotificationCategory, NotificationService, RecipientModel,
};
use shared_config::AppConfig;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::messages::{self, MessageContext};

/// Feed notifications and SMS for both parties of an appointment.
pub struct AppointmentNotifier {
    notifications: NotificationService,
    messenger: Arc<dyn Messenger>,
}

impl AppointmentNotifier {
    pub fn new(config: &AppConfig, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            notifications: NotificationService::new(config),
            messenger,
        }
    }

    /// "Appointment Created" for the patient, "New Appointment Request" for the doctor.
    pub async fn booking_created(
        &self,
        appointment: &Appointment,
        ctx: &MessageContext,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        self.notify(
            appointment.patient_id,
            RecipientModel::Patient,
            messages::CREATED_TITLE,
            messages::patient_created(ctx, appointment.token_number),
            messages::patient_link(&appointment.id),
            auth_token,
        ).await?;

        self.notify(
            appointment.doctor_id,
            RecipientModel::Doctor,
            messages::REQUEST_TITLE,
            messages::doctor_created(ctx, appointment.token_number),
            messages::doctor_link(&appointment.id),
            auth_token,
        ).await?;

        Ok(())
    }

    /// Tell both parties about a new status. `appointment` must be populated.
    ///
    /// SMS go out on detached tasks; their handles are returned so callers
    /// that care (tests) can wait for them.
    pub async fn status_changed(
        &self,
        appointment: &Appointment,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Vec<JoinHandle<()>>, AppointmentError> {
        let ctx = context_for(appointment);
        let mut sms_tasks = Vec::new();

        if let Some(patient_user) = appointment.patient.as_ref().and_then(|p| p.user.as_ref()) {
            if let Some(phone) = patient_user.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
                let greeting = patient_user.name.as_deref().unwrap_or(&ctx.patient_name);
                let body = messages::patient_status_sms(&ctx, greeting, status);
                sms_tasks.push(self.send_sms_detached(phone.to_string(), body));
            }

            self.notify(
                appointment.patient_id,
                RecipientModel::Patient,
                messages::STATUS_TITLE,
                messages::patient_status(&ctx, status),
                messages::patient_link(&appointment.id),
                auth_token,
            ).await?;
        }

        if let Some(doctor_user) = appointment.doctor.as_ref().and_then(|d| d.user.as_ref()) {
            if let Some(phone) = doctor_user.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
                let body = messages::doctor_status_sms(&ctx, status);
                sms_tasks.push(self.send_sms_detached(phone.to_string(), body));
            }

            self.notify(
                appointment.doctor_id,
                RecipientModel::Doctor,
                messages::STATUS_TITLE,
                messages::doctor_status(&ctx, status),
                messages::doctor_link(&appointment.id),
                auth_token,
            ).await?;
        }

        Ok(sms_tasks)
    }

    async fn notify(
        &self,
        recipient_id: Uuid,
        on_model: RecipientModel,
        title: &str,
        message: String,
        link: String,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        self.notifications.create(NewNotification {
            recipient_id,
            on_model,
            title: title.to_string(),
            message,
            category: NotificationCategory::Appointment,
            link: Some(link),
        }, auth_token).await?;
        Ok(())
    }

    fn send_sms_detached(&self, to: String, body: String) -> JoinHandle<()> {
        debug!("Queueing status SMS to {}", to);
        let messenger = Arc::clone(&self.messenger);
        tokio::spawn(async move {
            if let Err(e) = messenger.send_sms(&to, &body, DeliveryMode::BestEffort).await {
                error!("Failed to send status SMS to {}: {}", to, e);
            }
        })
    }
}

/// Message context from a populated appointment.
pub fn context_for(appointment: &Appointment) -> MessageContext {
    let patient = appointment.patient.as_ref();
    let doctor_name = appointment.doctor
        .as_ref()
        .and_then(|d| d.user.as_ref())
        .and_then(|u| u.name.as_deref());

    MessageContext::new(
        patient.and_then(|p| p.name.as_deref()),
        patient.and_then(|p| p.patient_id.as_deref()),
        doctor_name,
        appointment.date,
        appointment.time,
    )
}
