// Public modules
pub mod auth;
pub mod config;
pub mod domains;
pub mod errors;
pub mod globals;
pub mod types;
pub mod validation;

// Private modules
mod db_migration;

pub use config::Settings;

// Entry point for initialization
/// Connect to the database, apply migrations and register all services.
/// This function must be called before any `globals::get_*` accessor.
pub async fn initialize(settings: Settings) -> errors::ServiceResult<()> {
    globals::initialize(settings).await
}

/// Same as [`initialize`], with settings read from the environment (and `.env`)
pub async fn initialize_from_env() -> errors::ServiceResult<()> {
    let settings = Settings::from_env()?;
    globals::initialize(settings).await
}

/// Get a reference to the SQLite connection pool
/// This is primarily for internal use
pub fn get_db_pool() -> errors::ServiceResult<sqlx::SqlitePool> {
    globals::get_db_pool()
}
