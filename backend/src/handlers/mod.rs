//! HTTP handlers

pub mod dashboard;
pub mod feedback;
pub mod health;
pub mod scan;

pub use dashboard::{get_dashboard, get_zone_weights};
pub use feedback::submit_feedback;
pub use health::health_check;
pub use scan::{analyze_scan, get_environment};
