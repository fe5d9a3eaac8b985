pub mod fare;
pub mod rider_application;
