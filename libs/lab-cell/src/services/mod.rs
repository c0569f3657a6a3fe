pub mod lab;
pub mod orders;

pub use lab::LabService;
pub use orders::LabOrderService;
