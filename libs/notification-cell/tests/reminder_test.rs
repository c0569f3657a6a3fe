use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use notification_cell::models::{DeliveryMode, DeliveryReceipt, MessagingError};
use notification_cell::services::{Messenger, ReminderScheduler};

#[derive(Default)]
struct RecordingMessenger {
    calls: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_sms(&self, _to: &str, _body: &str, _mode: DeliveryMode) -> Result<Option<DeliveryReceipt>, MessagingError> {
        Ok(None)
    }

    async fn make_call(&self, to: &str, twiml_url: &str, _mode: DeliveryMode) -> Result<Option<DeliveryReceipt>, MessagingError> {
        self.calls.lock().unwrap().push((to.to_string(), twiml_url.to_string()));
        if self.fail {
            return Err(MessagingError::Transport("connection reset".to_string()));
        }
        Ok(Some(DeliveryReceipt { sid: "CA1".to_string(), status: None }))
    }
}

#[tokio::test(start_paused = true)]
async fn test_call_fires_only_after_delay() {
    let messenger = Arc::new(RecordingMessenger::default());
    let scheduler = ReminderScheduler::new(messenger.clone());

    let handle = scheduler.schedule_call(
        "9876543210".to_string(),
        "https://example.com/reminder.xml".to_string(),
        Duration::from_secs(600),
    );

    tokio::time::sleep(Duration::from_secs(599)).await;
    assert!(messenger.calls.lock().unwrap().is_empty());

    handle.await.unwrap();
    let calls = messenger.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "9876543210");
    assert_eq!(calls[0].1, "https://example.com/reminder.xml");
}

#[tokio::test(start_paused = true)]
async fn test_failed_call_does_not_panic_the_task() {
    let messenger = Arc::new(RecordingMessenger { fail: true, ..Default::default() });
    let scheduler = ReminderScheduler::new(messenger.clone());

    let handle = scheduler.schedule_call("9876543210".to_string(), "https://x".to_string(), Duration::from_secs(1));

    assert!(handle.await.is_ok());
    assert_eq!(messenger.calls.lock().unwrap().len(), 1);
}
