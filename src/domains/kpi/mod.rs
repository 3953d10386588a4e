pub mod repository;
pub mod service;
pub mod types;

pub use repository::{KpiRepository, SqliteKpiRepository};
pub use service::{KpiService, KpiServiceImpl};
pub use types::{Kpi, KpiResponse, NewKpi};
