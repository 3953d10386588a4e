use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};
use crate::types::UserRole;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// A single KPI review embedded in the employee document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Rating {
    pub kpi_id: Uuid,
    pub self_rating: Option<f64>,
    pub manager_rating: Option<f64>,
    /// Weightage of the KPI when the rating was first recorded
    pub weightage: Option<f64>,
    pub comments: Option<String>,
    pub manager_remarks: Option<String>,
}

/// Employee aggregate: identity, reporting line and embedded ratings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub manager_id: Option<Uuid>,
    pub ratings: Vec<Rating>,
    /// Cached mean of manager ratings, refreshed on every review save
    pub overall_performance_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn rating_for(&self, kpi_id: Uuid) -> Option<&Rating> {
        self.ratings.iter().find(|r| r.kpi_id == kpi_id)
    }
}

/// Fields to merge into a rating entry. `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingPatch {
    pub self_rating: Option<f64>,
    pub manager_rating: Option<f64>,
    pub weightage: Option<f64>,
    pub comments: Option<String>,
    pub manager_remarks: Option<String>,
}

impl RatingPatch {
    pub fn self_review(rating: f64, comments: Option<String>) -> Self {
        Self {
            self_rating: Some(rating),
            comments,
            ..Default::default()
        }
    }

    pub fn manager_review(rating: f64, remarks: Option<String>) -> Self {
        Self {
            manager_rating: Some(rating),
            manager_remarks: remarks,
            ..Default::default()
        }
    }

    pub fn with_weightage(mut self, weightage: f64) -> Self {
        self.weightage = Some(weightage);
        self
    }
}

/// NewEmployee DTO - used when registering an employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    /// Role label, e.g. "Manager"; defaults to Executives/Associates when empty
    pub designation: Option<String>,
    /// Manager id as submitted by the form; an empty string means no manager
    pub manager_id: Option<String>,
}

impl NewEmployee {
    pub fn parsed_role(&self) -> DomainResult<UserRole> {
        match self.designation.as_deref().map(str::trim) {
            None | Some("") => Ok(UserRole::default()),
            Some(label) => UserRole::from_str(label).ok_or_else(|| {
                DomainError::Validation(ValidationError::invalid_value("designation", "unknown role"))
            }),
        }
    }

    pub fn parsed_manager_id(&self) -> DomainResult<Option<Uuid>> {
        parse_optional_uuid(self.manager_id.as_deref())
    }
}

impl Validate for NewEmployee {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .not_blank()
            .max_length(100)
            .validate()?;

        ValidationBuilder::new("email", Some(self.email.clone()))
            .required()
            .email()
            .validate()?;

        self.parsed_role()?;
        self.parsed_manager_id()?;
        Ok(())
    }
}

/// Self review submitted by the employee being reviewed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfReview {
    pub kpi_id: Option<Uuid>,
    pub self_rating: Option<f64>,
    pub comments: Option<String>,
}

impl Validate for SelfReview {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("kpi_id", self.kpi_id)
            .required()
            .validate()?;
        if self.self_rating.is_none() && self.comments.is_none() {
            return Err(DomainError::Validation(ValidationError::required("self_rating")));
        }
        crate::validation::common::validate_rating("self_rating", self.self_rating)
    }
}

/// Review submitted by the employee's direct manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerReview {
    pub employee_id: Option<Uuid>,
    pub kpi_id: Option<Uuid>,
    pub manager_rating: Option<f64>,
    pub manager_remarks: Option<String>,
}

impl Validate for ManagerReview {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("employee_id", self.employee_id)
            .required()
            .validate()?;
        ValidationBuilder::new("kpi_id", self.kpi_id)
            .required()
            .validate()?;
        if self.manager_rating.is_none() && self.manager_remarks.is_none() {
            return Err(DomainError::Validation(ValidationError::required("manager_rating")));
        }
        crate::validation::common::validate_rating("manager_rating", self.manager_rating)
    }
}

/// Minimal reporting-line view of an employee used by the hierarchy index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyNode {
    pub id: Uuid,
    pub manager_id: Option<Uuid>,
    pub role: UserRole,
}

/// Role histogram for a reporting scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub total_users: u64,
    pub role_counts: BTreeMap<UserRole, u64>,
}

/// Lightweight employee projection (pickers, report joins)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl From<&Employee> for EmployeeSummary {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id,
            name: e.name.clone(),
            role: e.role,
        }
    }
}

/// EmployeeResponse DTO - used for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub manager_id: Option<Uuid>,
    pub ratings: Vec<Rating>,
    pub overall_performance_rating: f64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subordinates: Option<Vec<EmployeeSummary>>,
}

impl From<Employee> for EmployeeResponse {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            name: e.name,
            email: e.email,
            role: e.role,
            manager_id: e.manager_id,
            ratings: e.ratings,
            overall_performance_rating: e.overall_performance_rating,
            created_at: e.created_at.to_rfc3339(),
            updated_at: e.updated_at.to_rfc3339(),
            subordinates: None,
        }
    }
}

impl EmployeeResponse {
    pub fn with_subordinates(mut self, subordinates: Vec<EmployeeSummary>) -> Self {
        self.subordinates = Some(subordinates);
        self
    }
}

/// EmployeeRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub manager_id: Option<String>,
    pub ratings: String,
    pub overall_performance_rating: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl EmployeeRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<Employee> {
        let ratings: Vec<Rating> = serde_json::from_str(&self.ratings)
            .map_err(|e| DomainError::Internal(format!("Invalid ratings document for {}: {}", self.id, e)))?;

        Ok(Employee {
            id: Uuid::parse_str(&self.id)
                .map_err(|_| DomainError::InvalidUuid(self.id.clone()))?,
            name: self.name,
            email: self.email,
            role: parse_role(&self.role)?,
            manager_id: parse_optional_uuid(self.manager_id.as_deref())?,
            ratings,
            overall_performance_rating: self.overall_performance_rating,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Row for the reporting-line projection
#[derive(Debug, Clone, FromRow)]
pub struct HierarchyNodeRow {
    pub id: String,
    pub manager_id: Option<String>,
    pub role: String,
}

impl HierarchyNodeRow {
    pub fn into_node(self) -> DomainResult<HierarchyNode> {
        Ok(HierarchyNode {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id.clone()))?,
            manager_id: parse_optional_uuid(self.manager_id.as_deref())?,
            role: parse_role(&self.role)?,
        })
    }
}

/// Row for the lightweight summary projection
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeSummaryRow {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl EmployeeSummaryRow {
    pub fn into_summary(self) -> DomainResult<EmployeeSummary> {
        Ok(EmployeeSummary {
            id: Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id.clone()))?,
            name: self.name,
            role: parse_role(&self.role)?,
        })
    }
}

pub(crate) fn parse_role(label: &str) -> DomainResult<UserRole> {
    UserRole::from_str(label).ok_or_else(|| DomainError::Internal(format!("Unknown role stored: {}", label)))
}

pub(crate) fn parse_optional_uuid(raw: Option<&str>) -> DomainResult<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => Uuid::parse_str(id)
            .map(Some)
            .map_err(|_| DomainError::InvalidUuid(id.to_string())),
    }
}

pub(crate) fn parse_datetime(raw: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DomainError::Internal(format!("Invalid date format: {}", raw)))
}
