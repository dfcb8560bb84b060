//! Business logic services for the Sniffer server

pub mod dashboard;
pub mod feedback;
pub mod scan;

pub use dashboard::DashboardService;
pub use feedback::FeedbackService;
pub use scan::ScanService;
