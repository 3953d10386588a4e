use crate::config::Settings;
use crate::domains::course::repository::{CourseRepository, SqliteCourseRepository};
use crate::domains::course::service::{CourseService, CourseServiceImpl};
use crate::domains::employee::repository::{EmployeeRepository, SqliteEmployeeRepository};
use crate::domains::employee::service::{EmployeeService, EmployeeServiceImpl};
use crate::domains::kpi::repository::{KpiRepository, SqliteKpiRepository};
use crate::domains::kpi::service::{KpiService, KpiServiceImpl};
use crate::domains::performance::repository::{PerformanceRepository, SqlitePerformanceRepository};
use crate::domains::performance::service::{PerformanceService, PerformanceServiceImpl};
use crate::errors::{ServiceError, ServiceResult};
use crate::types::PaginationParams;
use lazy_static::lazy_static;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// Global state definitions
lazy_static! {
    static ref INIT_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    static ref DB_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);
    static ref SETTINGS: Mutex<Option<Settings>> = Mutex::new(None);

    static ref EMPLOYEE_REPO: Mutex<Option<Arc<dyn EmployeeRepository>>> = Mutex::new(None);
    static ref KPI_REPO: Mutex<Option<Arc<dyn KpiRepository>>> = Mutex::new(None);
    static ref PERFORMANCE_REPO: Mutex<Option<Arc<dyn PerformanceRepository>>> = Mutex::new(None);
    static ref COURSE_REPO: Mutex<Option<Arc<dyn CourseRepository>>> = Mutex::new(None);

    static ref EMPLOYEE_SERVICE: Mutex<Option<Arc<dyn EmployeeService>>> = Mutex::new(None);
    static ref KPI_SERVICE: Mutex<Option<Arc<dyn KpiService>>> = Mutex::new(None);
    static ref PERFORMANCE_SERVICE: Mutex<Option<Arc<dyn PerformanceService>>> = Mutex::new(None);
    static ref COURSE_SERVICE: Mutex<Option<Arc<dyn CourseService>>> = Mutex::new(None);
}

/// Clone the value out of a registry slot, or report what is missing
fn read_slot<T: Clone>(slot: &Mutex<Option<T>>, name: &str) -> ServiceResult<T> {
    slot.lock()
        .map_err(|_| ServiceError::Configuration(format!("{} lock poisoned", name)))?
        .clone()
        .ok_or_else(|| ServiceError::Configuration(format!("{} not initialized", name)))
}

fn write_slot<T>(slot: &Mutex<Option<T>>, name: &str, value: T) -> ServiceResult<()> {
    *slot
        .lock()
        .map_err(|_| ServiceError::Configuration(format!("{} lock poisoned", name)))? = Some(value);
    Ok(())
}

// --- Getter Functions ---

pub fn get_db_pool() -> ServiceResult<SqlitePool> {
    read_slot(&DB_POOL, "DB_POOL")
}
pub fn get_settings() -> ServiceResult<Settings> {
    read_slot(&SETTINGS, "SETTINGS")
}
/// First page at the configured page size
pub fn default_pagination() -> ServiceResult<PaginationParams> {
    Ok(PaginationParams::new(1, get_settings()?.default_per_page))
}

pub fn get_employee_repo() -> ServiceResult<Arc<dyn EmployeeRepository>> {
    read_slot(&EMPLOYEE_REPO, "EMPLOYEE_REPO")
}
pub fn get_kpi_repo() -> ServiceResult<Arc<dyn KpiRepository>> {
    read_slot(&KPI_REPO, "KPI_REPO")
}
pub fn get_performance_repo() -> ServiceResult<Arc<dyn PerformanceRepository>> {
    read_slot(&PERFORMANCE_REPO, "PERFORMANCE_REPO")
}
pub fn get_course_repo() -> ServiceResult<Arc<dyn CourseRepository>> {
    read_slot(&COURSE_REPO, "COURSE_REPO")
}

pub fn get_employee_service() -> ServiceResult<Arc<dyn EmployeeService>> {
    read_slot(&EMPLOYEE_SERVICE, "EMPLOYEE_SERVICE")
}
pub fn get_kpi_service() -> ServiceResult<Arc<dyn KpiService>> {
    read_slot(&KPI_SERVICE, "KPI_SERVICE")
}
pub fn get_performance_service() -> ServiceResult<Arc<dyn PerformanceService>> {
    read_slot(&PERFORMANCE_SERVICE, "PERFORMANCE_SERVICE")
}
pub fn get_course_service() -> ServiceResult<Arc<dyn CourseService>> {
    read_slot(&COURSE_SERVICE, "COURSE_SERVICE")
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Connect, migrate and register every repository and service.
/// Safe to call more than once; later calls are no-ops.
pub async fn initialize(settings: Settings) -> ServiceResult<()> {
    // Acquire the async mutex to ensure single initialization
    let _guard = INIT_MUTEX.lock().await;

    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }

    let result = initialize_internal(settings).await;

    // Mark as initialized only if successful
    if result.is_ok() {
        INITIALIZED.store(true, Ordering::Release);
    }

    result
}

async fn initialize_internal(settings: Settings) -> ServiceResult<()> {
    // Initialize logging first
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "debug");
        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "info");
    }

    // Initialize env_logger if not already initialized
    let _ = env_logger::try_init();

    log::info!("Starting initialization");
    log::debug!("Database URL: {}", settings.database_url);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .map_err(|e| {
            log::error!("Database connection failed: {}", e);
            ServiceError::Configuration(format!("Database connection failed: {}", e))
        })?;

    // Run database migrations BEFORE creating services
    crate::db_migration::run_migrations(&pool).await?;

    register(pool, settings)?;

    log::info!("Initialization complete");
    Ok(())
}

/// Build the repository and service graph over `pool` and publish it
fn register(pool: SqlitePool, settings: Settings) -> ServiceResult<()> {
    let employee_repo: Arc<dyn EmployeeRepository> = Arc::new(SqliteEmployeeRepository::new(pool.clone()));
    let kpi_repo: Arc<dyn KpiRepository> = Arc::new(SqliteKpiRepository::new(pool.clone()));
    let performance_repo: Arc<dyn PerformanceRepository> = Arc::new(SqlitePerformanceRepository::new(pool.clone()));
    let course_repo: Arc<dyn CourseRepository> = Arc::new(SqliteCourseRepository::new(pool.clone()));

    let employee_service: Arc<dyn EmployeeService> =
        Arc::new(EmployeeServiceImpl::new(employee_repo.clone(), kpi_repo.clone()));
    let kpi_service: Arc<dyn KpiService> = Arc::new(KpiServiceImpl::new(kpi_repo.clone()));
    let performance_service: Arc<dyn PerformanceService> = Arc::new(PerformanceServiceImpl::new(
        performance_repo.clone(),
        employee_repo.clone(),
        kpi_repo.clone(),
    ));
    let course_service: Arc<dyn CourseService> = Arc::new(CourseServiceImpl::new(
        course_repo.clone(),
        settings.course_completion_threshold,
    ));

    write_slot(&DB_POOL, "DB_POOL", pool)?;
    write_slot(&SETTINGS, "SETTINGS", settings)?;
    write_slot(&EMPLOYEE_REPO, "EMPLOYEE_REPO", employee_repo)?;
    write_slot(&KPI_REPO, "KPI_REPO", kpi_repo)?;
    write_slot(&PERFORMANCE_REPO, "PERFORMANCE_REPO", performance_repo)?;
    write_slot(&COURSE_REPO, "COURSE_REPO", course_repo)?;
    write_slot(&EMPLOYEE_SERVICE, "EMPLOYEE_SERVICE", employee_service)?;
    write_slot(&KPI_SERVICE, "KPI_SERVICE", kpi_service)?;
    write_slot(&PERFORMANCE_SERVICE, "PERFORMANCE_SERVICE", performance_service)?;
    write_slot(&COURSE_SERVICE, "COURSE_SERVICE", course_service)?;
    Ok(())
}
