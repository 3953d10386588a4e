use crate::auth::AuthContext;
use crate::domains::employee::hierarchy::{overall_rating, Hierarchy};
use crate::domains::employee::repository::EmployeeRepository;
use crate::domains::employee::types::{Employee, EmployeeSummary};
use crate::domains::kpi::repository::KpiRepository;
use crate::domains::performance::report::{build_scorecard, inner_join, project_row};
use crate::domains::performance::repository::PerformanceRepository;
use crate::domains::performance::types::{
    EmployeeAchievement, EmployeeScorecard, NewPerformance, PerformanceFilter, PerformanceRecord,
    PerformanceReportRow,
};
use crate::errors::{DomainError, ServiceError, ServiceResult, ValidationError};
use crate::types::{PaginatedResult, PaginationParams, Permission, ReportingScope};
use crate::validation::Validate;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining performance service operations
#[async_trait]
pub trait PerformanceService: Send + Sync {
    /// Record a KPI result for one of the caller's reports
    async fn add_performance(
        &self,
        new_record: NewPerformance,
        auth: &AuthContext,
    ) -> ServiceResult<PerformanceReportRow>;

    /// The employee's own achievement figure for a record about them
    async fn update_employee_achievement(
        &self,
        record_id: Uuid,
        update: EmployeeAchievement,
        auth: &AuthContext,
    ) -> ServiceResult<PerformanceRecord>;

    /// Paged report; defaults to records the caller added
    async fn list_performance(
        &self,
        filter: Option<PerformanceFilter>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PerformanceReportRow>>;

    async fn get_scorecard(&self, employee_id: Uuid, auth: &AuthContext) -> ServiceResult<EmployeeScorecard>;

    /// Scorecards for everyone in the caller's reporting scope, in creation order
    async fn team_scorecards(&self, auth: &AuthContext) -> ServiceResult<Vec<EmployeeScorecard>>;
}

/// Implementation of the performance service
pub struct PerformanceServiceImpl {
    repo: Arc<dyn PerformanceRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
    kpi_repo: Arc<dyn KpiRepository>,
}

impl PerformanceServiceImpl {
    pub fn new(
        repo: Arc<dyn PerformanceRepository>,
        employee_repo: Arc<dyn EmployeeRepository>,
        kpi_repo: Arc<dyn KpiRepository>,
    ) -> Self {
        Self { repo, employee_repo, kpi_repo }
    }

    /// Self, the direct manager, or an organisation-wide role
    fn authorize_employee_view(&self, employee: &Employee, auth: &AuthContext) -> ServiceResult<()> {
        if employee.id == auth.user_id {
            return Ok(());
        }
        auth.authorize_manager_or_org(employee.manager_id)
    }

    /// Shared pipeline for single and team scorecards: records, KPIs and
    /// employees are joined in memory, then rolled up per employee.
    async fn scorecards_for(&self, employees: Vec<Employee>) -> ServiceResult<Vec<EmployeeScorecard>> {
        let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
        let records = self.repo.find_by_employees(&ids).await?;

        let kpi_ids: Vec<Uuid> = records
            .iter()
            .map(|r| r.kpi_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let kpis = self.kpi_repo.find_by_ids(&kpi_ids).await?;

        let summaries: Vec<EmployeeSummary> = employees.iter().map(EmployeeSummary::from).collect();
        let rows = inner_join(&records, &kpis, &summaries);

        Ok(employees
            .iter()
            .zip(summaries.iter())
            .map(|(employee, summary)| build_scorecard(summary, &rows, overall_rating(employee)))
            .collect())
    }
}

#[async_trait]
impl PerformanceService for PerformanceServiceImpl {
    async fn add_performance(
        &self,
        new_record: NewPerformance,
        auth: &AuthContext,
    ) -> ServiceResult<PerformanceReportRow> {
        auth.authorize(Permission::RecordPerformance)?;
        new_record.validate()?;

        let kpi_id = new_record.kpi_id.ok_or_else(|| ValidationError::required("kpi_id"))?;
        let employee_id = new_record
            .employee_id
            .ok_or_else(|| ValidationError::required("employee_id"))?;

        let kpi = self.kpi_repo.find_by_id(kpi_id).await.map_err(ServiceError::Domain)?;
        let employee = self
            .employee_repo
            .find_by_id(employee_id)
            .await
            .map_err(ServiceError::Domain)?;
        auth.authorize_manager_or_org(employee.manager_id)?;

        let record = self.repo.create(&new_record, auth).await?;
        log::info!(
            "Performance {} recorded by {} for {} on KPI {}",
            record.id,
            auth.user_id,
            employee.id,
            kpi.id
        );
        Ok(project_row(&record, &kpi, &EmployeeSummary::from(&employee)))
    }

    async fn update_employee_achievement(
        &self,
        record_id: Uuid,
        update: EmployeeAchievement,
        auth: &AuthContext,
    ) -> ServiceResult<PerformanceRecord> {
        auth.authorize(Permission::SubmitSelfReview)?;

        let record = self.repo.find_by_id(record_id).await.map_err(ServiceError::Domain)?;
        auth.authorize_self(&record.employee_id)?;
        update.validate()?;

        let updated = self
            .repo
            .update_employee_achievement(record_id, &update.emp_achievement)
            .await?;
        log::debug!("Employee achievement updated on performance {}", record_id);
        Ok(updated)
    }

    async fn list_performance(
        &self,
        filter: Option<PerformanceFilter>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PerformanceReportRow>> {
        auth.authorize(Permission::ViewPerformance)?;

        let filter = filter.unwrap_or(PerformanceFilter::AddedBy(auth.user_id));
        match filter {
            PerformanceFilter::AddedBy(recorder) if recorder != auth.user_id => {
                if auth.reporting_scope() != ReportingScope::Organization {
                    return Err(ServiceError::PermissionDenied(
                        "You can only list records you added".to_string(),
                    ));
                }
            }
            PerformanceFilter::Employee(employee_id) if employee_id != auth.user_id => {
                let employee = self
                    .employee_repo
                    .find_by_id(employee_id)
                    .await
                    .map_err(ServiceError::Domain)?;
                self.authorize_employee_view(&employee, auth)?;
            }
            _ => {}
        }

        let page = self.repo.find_report_page(filter, params).await?;
        log::debug!(
            "Performance page {}/{} ({} rows of {}) for {:?}",
            page.page,
            page.total_pages,
            page.items.len(),
            page.total,
            filter
        );
        Ok(page)
    }

    async fn get_scorecard(&self, employee_id: Uuid, auth: &AuthContext) -> ServiceResult<EmployeeScorecard> {
        auth.authorize(Permission::ViewPerformance)?;

        let employee = self
            .employee_repo
            .find_by_id(employee_id)
            .await
            .map_err(ServiceError::Domain)?;
        self.authorize_employee_view(&employee, auth)?;

        let mut cards = self.scorecards_for(vec![employee]).await?;
        cards
            .pop()
            .ok_or_else(|| DomainError::Internal("Scorecard rollup produced no card".to_string()).into())
    }

    async fn team_scorecards(&self, auth: &AuthContext) -> ServiceResult<Vec<EmployeeScorecard>> {
        auth.authorize(Permission::ViewPerformance)?;

        let scope = auth.reporting_scope();
        if scope == ReportingScope::NoReports {
            return Ok(Vec::new());
        }

        let hierarchy = Hierarchy::from_nodes(self.employee_repo.hierarchy_nodes().await?);
        let member_ids: Vec<Uuid> = hierarchy.members(scope).iter().map(|n| n.id).collect();
        let members = self.employee_repo.find_by_ids(&member_ids).await?;

        self.scorecards_for(members).await
    }
}
