pub mod progress;
pub mod repository;
pub mod service;
pub mod types;

pub use repository::{CourseRepository, SqliteCourseRepository};
pub use service::{CourseService, CourseServiceImpl};
pub use types::{Course, CourseAnalytics, CourseFilter, NewCourse, PriceSort, VideoProgressUpdate};
