use crate::errors::ServiceError;
use std::env;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PER_PAGE: u32 = 10;
const DEFAULT_COMPLETION_THRESHOLD: f64 = 97.0;

/// Runtime settings, read from the process environment
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub default_per_page: u32,
    /// Video progress percentage at which a student counts as having completed a course
    pub course_completion_threshold: f64,
}

impl Settings {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            default_per_page: DEFAULT_PER_PAGE,
            course_completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
        }
    }

    /// Load from the environment, reading a `.env` file first if one exists.
    /// `DATABASE_URL` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ServiceError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ServiceError::Configuration("DATABASE_URL is not set".to_string()))?;

        let mut settings = Self::new(database_url);
        if let Some(raw) = lookup("DB_MAX_CONNECTIONS") {
            settings.max_connections = parse_setting("DB_MAX_CONNECTIONS", &raw)?;
        }
        if let Some(raw) = lookup("DEFAULT_PER_PAGE") {
            settings.default_per_page = parse_setting::<u32>("DEFAULT_PER_PAGE", &raw)?.max(1);
        }
        if let Some(raw) = lookup("COURSE_COMPLETION_THRESHOLD") {
            let threshold: f64 = parse_setting("COURSE_COMPLETION_THRESHOLD", &raw)?;
            if !(0.0..=100.0).contains(&threshold) {
                return Err(ServiceError::Configuration(format!(
                    "COURSE_COMPLETION_THRESHOLD must be a percentage, got {}",
                    threshold
                )));
            }
            settings.course_completion_threshold = threshold;
        }
        Ok(settings)
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::Configuration(format!("{} has an invalid value: {}", key, raw)))
}
