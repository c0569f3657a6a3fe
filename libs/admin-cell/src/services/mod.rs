pub mod analytics;
pub mod hospitals;
pub mod users;

pub use analytics::AnalyticsService;
pub use hospitals::HospitalService;
pub use users::UserAdminService;
