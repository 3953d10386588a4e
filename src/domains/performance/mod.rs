pub mod report;
pub mod repository;
pub mod scoring;
pub mod service;
pub mod types;

pub use repository::{PerformanceRepository, SqlitePerformanceRepository};
pub use scoring::{compute_score, compute_score_text};
pub use service::{PerformanceService, PerformanceServiceImpl};
pub use types::{EmployeeScorecard, NewPerformance, PerformanceFilter, PerformanceRecord, PerformanceReportRow};
