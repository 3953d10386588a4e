use crate::domains::employee::types::{parse_datetime, parse_role};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::types::UserRole;
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A manager's record of one KPI for one employee.
///
/// Weightage and goal are copied from the form at creation time so later
/// KPI edits do not rewrite history. Achievements are kept as submitted text;
/// an empty string means "not submitted yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub id: Uuid,
    pub kpi_id: Uuid,
    pub employee_id: Uuid,
    pub added_by: Uuid,
    pub weightage: f64,
    pub goal: f64,
    pub manager_achievement: String,
    pub emp_achievement: String,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// NewPerformance DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPerformance {
    pub kpi_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub weightage: Option<f64>,
    pub goal: Option<f64>,
    pub manager_achievement: Option<String>,
    pub remarks: String,
}

impl Validate for NewPerformance {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("kpi_id", self.kpi_id)
            .required()
            .not_nil()
            .validate()?;

        ValidationBuilder::new("employee_id", self.employee_id)
            .required()
            .not_nil()
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

        ValidationBuilder::new("remarks", Some(self.remarks.clone()))
            .required()
            .not_blank()
            .validate()?;

        validate_achievement_text("manager_achievement", self.manager_achievement.as_deref())
    }
}

/// Employee-side achievement submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeAchievement {
    pub emp_achievement: String,
}

impl Validate for EmployeeAchievement {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("emp_achievement", Some(self.emp_achievement.clone()))
            .required()
            .not_blank()
            .validate()?;
        validate_achievement_text("emp_achievement", Some(&self.emp_achievement))
    }
}

/// Non-empty achievements must read as a finite number when written.
/// Stored text that somehow fails this is still scored as 0 on read.
fn validate_achievement_text(field: &str, raw: Option<&str>) -> DomainResult<()> {
    match raw.map(str::trim) {
        None | Some("") => Ok(()),
        Some(text) => match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(()),
            _ => Err(DomainError::Validation(ValidationError::format(field, "must be a number"))),
        },
    }
}

/// Which records a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceFilter {
    /// Records the given manager recorded
    AddedBy(Uuid),
    /// Records about the given employee
    Employee(Uuid),
}

impl PerformanceFilter {
    pub fn column(&self) -> &'static str {
        match self {
            PerformanceFilter::AddedBy(_) => "added_by",
            PerformanceFilter::Employee(_) => "employee_id",
        }
    }

    pub fn key(&self) -> Uuid {
        match self {
            PerformanceFilter::AddedBy(id) | PerformanceFilter::Employee(id) => *id,
        }
    }
}

/// Flat report row: record joined with its KPI and employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReportRow {
    pub id: Uuid,
    pub remarks: String,
    pub created_at: String,
    pub updated_at: String,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_role: UserRole,
    pub kpi_id: Uuid,
    pub kpi_name: String,
    pub weightage: f64,
    pub goal: f64,
    pub manager_achievement: Option<f64>,
    pub emp_achievement: Option<f64>,
    /// Weighted score from the manager's achievement, 0 when none is in yet
    pub average: f64,
}

/// Per-employee rollup of report rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeScorecard {
    pub employee_id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub kpi_count: u64,
    pub total_score: f64,
    pub overall_rating: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct PerformanceRow {
    pub id: String,
    pub kpi_id: String,
    pub employee_id: String,
    pub added_by: String,
    pub weightage: f64,
    pub goal: f64,
    pub manager_achievement: String,
    pub emp_achievement: String,
    pub remarks: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PerformanceRow {
    pub fn into_entity(self) -> DomainResult<PerformanceRecord> {
        Ok(PerformanceRecord {
            id: parse_uuid(&self.id)?,
            kpi_id: parse_uuid(&self.kpi_id)?,
            employee_id: parse_uuid(&self.employee_id)?,
            added_by: parse_uuid(&self.added_by)?,
            weightage: self.weightage,
            goal: self.goal,
            manager_achievement: self.manager_achievement,
            emp_achievement: self.emp_achievement,
            remarks: self.remarks,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Record columns plus the names pulled in by the report join
#[derive(Debug, Clone, FromRow)]
pub struct PerformanceJoinRow {
    #[sqlx(flatten)]
    pub record: PerformanceRow,
    pub kpi_name: String,
    pub employee_name: String,
    pub employee_role: String,
}

impl PerformanceJoinRow {
    pub fn into_parts(self) -> DomainResult<(PerformanceRecord, String, String, UserRole)> {
        let role = parse_role(&self.employee_role)?;
        Ok((self.record.into_entity()?, self.kpi_name, self.employee_name, role))
    }
}

fn parse_uuid(raw: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DomainError::InvalidUuid(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewPerformance {
        NewPerformance {
            kpi_id: Some(Uuid::new_v4()),
            employee_id: Some(Uuid::new_v4()),
            weightage: Some(50.0),
            goal: Some(100.0),
            manager_achievement: Some("80".into()),
            remarks: "steady quarter".into(),
        }
    }

    #[test]
    fn every_reference_and_snapshot_is_required() {
        assert!(valid().validate().is_ok());
        for broken in [
            NewPerformance { kpi_id: None, ..valid() },
            NewPerformance { employee_id: None, ..valid() },
            NewPerformance { weightage: None, ..valid() },
            NewPerformance { goal: None, ..valid() },
            NewPerformance { remarks: String::new(), ..valid() },
        ] {
            assert!(matches!(
                broken.validate(),
                Err(DomainError::Validation(ValidationError::Required { .. }))
            ));
        }
    }

    #[test]
    fn achievement_text_must_be_numeric_when_present() {
        let blank = NewPerformance { manager_achievement: Some(String::new()), ..valid() };
        assert!(blank.validate().is_ok());

        let words = NewPerformance { manager_achievement: Some("eighty".into()), ..valid() };
        assert!(words.validate().is_err());

        assert!(EmployeeAchievement { emp_achievement: " ".into() }.validate().is_err());
        assert!(EmployeeAchievement { emp_achievement: "72.5".into() }.validate().is_ok());
    }

    #[test]
    fn filter_targets_one_column() {
        let id = Uuid::new_v4();
        assert_eq!(PerformanceFilter::AddedBy(id).column(), "added_by");
        assert_eq!(PerformanceFilter::Employee(id).column(), "employee_id");
        assert_eq!(PerformanceFilter::Employee(id).key(), id);
    }
}
