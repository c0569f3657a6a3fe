pub mod messaging;
pub mod notification;
pub mod reminder;

pub use messaging::{Messenger, TwilioClient};
pub use notification::NotificationService;
pub use reminder::ReminderScheduler;
