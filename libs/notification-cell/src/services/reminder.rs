// libs/notification-cell/src/services/reminder.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::models::DeliveryMode;
use crate::services::messaging::Messenger;

/// In-process delayed reminder calls.
///
/// Timers live only in the runtime: a restart drops every pending reminder,
/// and nothing retries a failed call.
#[derive(Clone)]
pub struct ReminderScheduler {
    messenger: Arc<dyn Messenger>,
}

impl ReminderScheduler {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Delay until `lead` before `appointment_at`, or `None` when that moment
    /// has already passed.
    pub fn reminder_delay(
        appointment_at: DateTime<Utc>,
        now: DateTime<Utc>,
        lead: chrono::Duration,
    ) -> Option<Duration> {
        let fire_at = appointment_at - lead;
        let delay = fire_at - now;
        if delay <= chrono::Duration::zero() {
            return None;
        }
        delay.to_std().ok()
    }

    /// Place a call to `to` after `delay`. Failures are logged and dropped.
    pub fn schedule_call(&self, to: String, twiml_url: String, delay: Duration) -> JoinHandle<()> {
        info!("Reminder call to {} scheduled in {} seconds", to, delay.as_secs());
        let messenger = Arc::clone(&self.messenger);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = messenger.make_call(&to, &twiml_url, DeliveryMode::Strict).await {
                error!("Error making scheduled call to {}: {}", to, e);
            }
        })
    }
}
