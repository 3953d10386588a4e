use crate::domains::employee::types::parse_datetime;
use crate::errors::{DomainError, DomainResult};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// KPI definition entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub id: Uuid,
    pub name: String,
    /// Share of the employee's overall score, in percentage points
    pub weightage: f64,
    pub goal: f64,
    pub achievement: Option<f64>,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// NewKpi DTO
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewKpi {
    pub name: String,
    pub weightage: Option<f64>,
    pub goal: Option<f64>,
    pub achievement: Option<f64>,
}

impl Validate for NewKpi {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .not_blank()
            .max_length(150)
            .validate()?;

        ValidationBuilder::new("weightage", self.weightage)
            .required()
            .finite()
            .range(0.0, 100.0)
            .validate()?;

        ValidationBuilder::new("goal", self.goal)
            .required()
            .finite()
            .validate()?;

        ValidationBuilder::new("achievement", self.achievement)
            .finite()
            .validate()?;

        Ok(())
    }
}

/// KpiResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiResponse {
    pub id: Uuid,
    pub name: String,
    pub weightage: f64,
    pub goal: f64,
    pub achievement: Option<f64>,
    pub added_by: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Kpi> for KpiResponse {
    fn from(kpi: Kpi) -> Self {
        Self {
            id: kpi.id,
            name: kpi.name,
            weightage: kpi.weightage,
            goal: kpi.goal,
            achievement: kpi.achievement,
            added_by: kpi.added_by,
            created_at: kpi.created_at.to_rfc3339(),
            updated_at: kpi.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct KpiRow {
    pub id: String,
    pub name: String,
    pub weightage: f64,
    pub goal: f64,
    pub achievement: Option<f64>,
    pub added_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl KpiRow {
    pub fn into_entity(self) -> DomainResult<Kpi> {
        Ok(Kpi {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id.clone()))?,
            name: self.name,
            weightage: self.weightage,
            goal: self.goal,
            achievement: self.achievement,
            added_by: Uuid::parse_str(&self.added_by)
                .map_err(|_| DomainError::InvalidUuid(self.added_by.clone()))?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}
