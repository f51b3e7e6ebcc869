pub mod alert;
pub mod device;
pub mod device_profile;
pub mod meter_reading;
pub mod threshold_config;

pub use alert::{AlertKind, Severity};
