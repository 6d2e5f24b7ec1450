pub mod capture_gate;
pub mod channel_status_publisher;
pub mod status_publisher;
