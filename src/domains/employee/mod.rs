pub mod hierarchy;
pub mod rating;
pub mod repository;
pub mod service;
pub mod types;

pub use hierarchy::{overall_rating, role_counts, Hierarchy};
pub use rating::upsert_rating;
pub use repository::{EmployeeRepository, SqliteEmployeeRepository};
pub use service::{EmployeeService, EmployeeServiceImpl};
pub use types::{Employee, EmployeeResponse, EmployeeSummary, Rating, RatingPatch, RoleCounts};
