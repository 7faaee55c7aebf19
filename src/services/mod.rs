pub mod access;
pub mod analytics_service;
pub mod enrollment_service;
pub mod grade_service;
pub mod navigation;
pub mod profile_service;
pub mod report_service;

pub use access::Actor;
pub use analytics_service::AnalyticsService;
pub use enrollment_service::EnrollmentService;
pub use grade_service::GradeService;
pub use navigation::{NavEntry, entries_for};
pub use profile_service::ProfileService;
pub use report_service::ReportService;
