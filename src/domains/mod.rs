pub mod core;
pub mod course;
pub mod employee;
pub mod kpi;
pub mod performance;
pub mod permission;

pub use employee::{EmployeeService, EmployeeServiceImpl};
pub use kpi::{KpiService, KpiServiceImpl};
pub use performance::{PerformanceService, PerformanceServiceImpl};
pub use course::{CourseService, CourseServiceImpl};
