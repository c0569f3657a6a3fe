pub mod booking;
pub mod messages;
pub mod notify;

pub use booking::AppointmentBookingService;
pub use notify::AppointmentNotifier;
