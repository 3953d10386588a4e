use crate::auth::AuthContext;
use crate::domains::employee::hierarchy::{overall_rating, role_counts, Hierarchy};
use crate::domains::employee::rating::upsert_rating;
use crate::domains::employee::repository::EmployeeRepository;
use crate::domains::employee::types::{
    EmployeeResponse, EmployeeSummary, ManagerReview, NewEmployee, RatingPatch, RoleCounts,
    SelfReview,
};
use crate::domains::kpi::repository::KpiRepository;
use crate::errors::{DomainError, ServiceError, ServiceResult, ValidationError};
use crate::types::{PaginatedResult, PaginationParams, Permission, ReportingScope, UserRole};
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining employee service operations
#[async_trait]
pub trait EmployeeService: Send + Sync {
    async fn register_employee(
        &self,
        new_employee: NewEmployee,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse>;

    /// Employee with their direct reports attached
    async fn get_employee(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<EmployeeResponse>;

    async fn list_employees(
        &self,
        manager_id: Option<Uuid>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<EmployeeResponse>>;

    /// Everyone holding a people-manager role, by name
    async fn list_managers(&self, auth: &AuthContext) -> ServiceResult<Vec<EmployeeSummary>>;

    async fn list_subordinates(
        &self,
        manager_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<EmployeeSummary>>;

    /// Move `employee_id` under `new_manager_id`; `None` detaches them
    async fn reassign_manager(
        &self,
        employee_id: Uuid,
        new_manager_id: Option<Uuid>,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse>;

    /// Role histogram over the caller's reporting scope
    async fn get_employee_counts(&self, auth: &AuthContext) -> ServiceResult<RoleCounts>;

    async fn submit_self_rating(
        &self,
        review: SelfReview,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse>;

    async fn submit_manager_rating(
        &self,
        review: ManagerReview,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse>;

    async fn get_overall_rating(&self, employee_id: Uuid, auth: &AuthContext) -> ServiceResult<f64>;
}

/// Implementation of the employee service
pub struct EmployeeServiceImpl {
    repo: Arc<dyn EmployeeRepository>,
    kpi_repo: Arc<dyn KpiRepository>,
}

impl EmployeeServiceImpl {
    pub fn new(repo: Arc<dyn EmployeeRepository>, kpi_repo: Arc<dyn KpiRepository>) -> Self {
        Self { repo, kpi_repo }
    }

    /// Readers of someone else's record need org scope or to be their manager
    fn authorize_view_of(
        &self,
        target_id: Uuid,
        target_manager_id: Option<Uuid>,
        auth: &AuthContext,
    ) -> ServiceResult<()> {
        if auth.user_id == target_id {
            return Ok(());
        }
        auth.authorize(Permission::ViewEmployees)?;
        auth.authorize_manager_or_org(target_manager_id)
    }

    /// Resolve the referenced manager, surfacing a dangling id as a validation error
    async fn ensure_manager_exists(&self, manager_id: Uuid) -> ServiceResult<()> {
        match self.repo.find_by_id(manager_id).await {
            Ok(_) => Ok(()),
            Err(DomainError::EntityNotFound(_, _)) => Err(ValidationError::relationship(&format!(
                "Manager {} does not exist",
                manager_id
            ))
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl EmployeeService for EmployeeServiceImpl {
    async fn register_employee(
        &self,
        new_employee: NewEmployee,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse> {
        auth.authorize(Permission::ManageEmployees)?;
        new_employee.validate()?;
        if self.repo.find_by_email(new_employee.email.trim()).await?.is_some() {
            return Err(ValidationError::unique("email").into());
        }

        if let Some(manager_id) = new_employee.parsed_manager_id()? {
            self.ensure_manager_exists(manager_id).await?;
        }

        let employee = self.repo.create(&new_employee).await?;
        log::info!("Registered employee {} as {}", employee.id, employee.role.as_str());
        Ok(EmployeeResponse::from(employee))
    }

    async fn get_employee(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<EmployeeResponse> {
        let employee = self.repo.find_by_id(id).await.map_err(ServiceError::Domain)?;
        self.authorize_view_of(employee.id, employee.manager_id, auth)?;

        let subordinates = self.repo.find_direct_reports(employee.id).await?;
        Ok(EmployeeResponse::from(employee).with_subordinates(subordinates))
    }

    async fn list_employees(
        &self,
        manager_id: Option<Uuid>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<EmployeeResponse>> {
        auth.authorize(Permission::ViewEmployees)?;

        // Outside org scope the listing is pinned to the caller's own reports
        let manager_filter = match auth.reporting_scope() {
            ReportingScope::Organization => manager_id,
            ReportingScope::DirectReports(me) => {
                if manager_id.is_some_and(|m| m != me) {
                    return Err(ServiceError::PermissionDenied(
                        "You can only list your own direct reports".to_string(),
                    ));
                }
                Some(me)
            }
            ReportingScope::NoReports => {
                return Ok(PaginatedResult::new(Vec::new(), 0, params));
            }
        };

        let page = self
            .repo
            .find_all(manager_filter, params.normalized())
            .await
            .map_err(ServiceError::Domain)?;
        Ok(page.map(EmployeeResponse::from))
    }

    async fn list_managers(&self, _auth: &AuthContext) -> ServiceResult<Vec<EmployeeSummary>> {
        // Registration forms need this list before the caller has any reports
        let roles: Vec<UserRole> = UserRole::ALL
            .iter()
            .copied()
            .filter(UserRole::is_people_manager)
            .collect();
        Ok(self.repo.find_summaries_by_roles(&roles).await?)
    }

    async fn list_subordinates(
        &self,
        manager_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<EmployeeSummary>> {
        if manager_id != auth.user_id {
            auth.authorize(Permission::ViewEmployees)?;
            if auth.reporting_scope() != ReportingScope::Organization {
                return Err(ServiceError::PermissionDenied(
                    "You can only list your own subordinates".to_string(),
                ));
            }
        }

        // Confirms the manager exists before reporting an empty team
        self.repo.find_by_id(manager_id).await.map_err(ServiceError::Domain)?;
        Ok(self.repo.find_direct_reports(manager_id).await?)
    }

    async fn reassign_manager(
        &self,
        employee_id: Uuid,
        new_manager_id: Option<Uuid>,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse> {
        auth.authorize(Permission::ManageEmployees)?;
        self.repo.find_by_id(employee_id).await.map_err(ServiceError::Domain)?;

        if let Some(manager_id) = new_manager_id {
            self.ensure_manager_exists(manager_id).await?;

            let hierarchy = Hierarchy::from_nodes(self.repo.hierarchy_nodes().await?);
            if hierarchy.would_create_cycle(employee_id, manager_id) {
                log::warn!("Rejected reassignment of {} under {}: cycle", employee_id, manager_id);
                return Err(DomainError::HierarchyCycle { employee_id, manager_id }.into());
            }
        }

        let updated = self.repo.update_manager(employee_id, new_manager_id).await?;
        log::info!("Employee {} now reports to {:?}", employee_id, new_manager_id);
        Ok(EmployeeResponse::from(updated))
    }

    async fn get_employee_counts(&self, auth: &AuthContext) -> ServiceResult<RoleCounts> {
        auth.authorize(Permission::ViewEmployeeCounts)?;

        let scope = auth.reporting_scope();
        if scope == ReportingScope::NoReports {
            return Ok(RoleCounts::default());
        }

        let population = self.repo.hierarchy_nodes().await?;
        Ok(role_counts(&population, scope))
    }

    async fn submit_self_rating(
        &self,
        review: SelfReview,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse> {
        auth.authorize(Permission::SubmitSelfReview)?;
        review.validate()?;
        let kpi_id = review
            .kpi_id
            .ok_or_else(|| ValidationError::required("kpi_id"))?;

        let kpi = self.kpi_repo.find_by_id(kpi_id).await.map_err(ServiceError::Domain)?;
        let employee = self.repo.find_by_id(auth.user_id).await.map_err(ServiceError::Domain)?;
        auth.authorize_self(&employee.id)?;

        let patch = RatingPatch {
            self_rating: review.self_rating,
            comments: review.comments,
            weightage: Some(kpi.weightage),
            ..Default::default()
        };

        // Fetch, merge, overwrite: a concurrent manager review may be lost.
        // A new entry grows the divisor, so the cached overall moves too.
        let mut updated = upsert_rating(employee, kpi_id, patch);
        updated.overall_performance_rating = overall_rating(&updated);
        let saved = self.repo.save_ratings(&updated).await?;
        log::debug!("Self rating for KPI {} saved by {}", kpi_id, auth.user_id);
        Ok(EmployeeResponse::from(saved))
    }

    async fn submit_manager_rating(
        &self,
        review: ManagerReview,
        auth: &AuthContext,
    ) -> ServiceResult<EmployeeResponse> {
        auth.authorize(Permission::SubmitManagerReview)?;
        review.validate()?;
        let employee_id = review
            .employee_id
            .ok_or_else(|| ValidationError::required("employee_id"))?;
        let kpi_id = review
            .kpi_id
            .ok_or_else(|| ValidationError::required("kpi_id"))?;

        let employee = self.repo.find_by_id(employee_id).await.map_err(ServiceError::Domain)?;
        auth.authorize_direct_manager_of(employee.manager_id)?;
        let kpi = self.kpi_repo.find_by_id(kpi_id).await.map_err(ServiceError::Domain)?;

        let patch = RatingPatch {
            manager_rating: review.manager_rating,
            manager_remarks: review.manager_remarks,
            weightage: Some(kpi.weightage),
            ..Default::default()
        };

        // Same fetch-merge-overwrite as self reviews; last writer wins
        let mut updated = upsert_rating(employee, kpi_id, patch);
        updated.overall_performance_rating = overall_rating(&updated);
        let saved = self.repo.save_ratings(&updated).await?;

        log::info!(
            "Manager {} rated {} on KPI {}; overall now {:.4}",
            auth.user_id,
            employee_id,
            kpi_id,
            saved.overall_performance_rating
        );
        Ok(EmployeeResponse::from(saved))
    }

    async fn get_overall_rating(&self, employee_id: Uuid, auth: &AuthContext) -> ServiceResult<f64> {
        let employee = self.repo.find_by_id(employee_id).await.map_err(ServiceError::Domain)?;
        self.authorize_view_of(employee.id, employee.manager_id, auth)?;
        Ok(overall_rating(&employee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_migration::test_pool;
    use crate::domains::employee::repository::SqliteEmployeeRepository;
    use crate::domains::kpi::repository::SqliteKpiRepository;
    use crate::domains::kpi::types::NewKpi;
    use crate::errors::ErrorKind;

    struct Fixture {
        svc: EmployeeServiceImpl,
        kpis: Arc<SqliteKpiRepository>,
        admin: AuthContext,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let kpis = Arc::new(SqliteKpiRepository::new(pool.clone()));
        let svc = EmployeeServiceImpl::new(Arc::new(SqliteEmployeeRepository::new(pool)), kpis.clone());
        Fixture { svc, kpis, admin: AuthContext::new(Uuid::new_v4(), UserRole::Admin) }
    }

    impl Fixture {
        async fn hire(&self, name: &str, role: UserRole, manager: Option<Uuid>) -> AuthContext {
            let created = self
                .svc
                .register_employee(
                    NewEmployee {
                        name: name.to_string(),
                        email: format!("{}@example.com", name.to_lowercase()),
                        designation: Some(role.as_str().to_string()),
                        manager_id: manager.map(|m| m.to_string()),
                    },
                    &self.admin,
                )
                .await
                .unwrap();
            AuthContext::new(created.id, created.role)
        }

        async fn kpi(&self, weightage: f64, owner: &AuthContext) -> Uuid {
            let new_kpi = NewKpi {
                name: "Delivery".into(),
                weightage: Some(weightage),
                goal: Some(100.0),
                achievement: None,
            };
            self.kpis.create(&new_kpi, owner).await.unwrap().id
        }
    }

    fn review(employee: Uuid, kpi: Uuid, rating: Option<f64>) -> ManagerReview {
        ManagerReview {
            employee_id: Some(employee),
            kpi_id: Some(kpi),
            manager_rating: rating,
            manager_remarks: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let f = fixture().await;
        f.hire("dup", UserRole::Manager, None).await;

        let again = NewEmployee {
            name: "Dup Two".into(),
            email: "dup@example.com".into(),
            designation: None,
            manager_id: Some(String::new()),
        };
        let err = f.svc.register_employee(again, &f.admin).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Validation(ValidationError::Unique { .. }))
        ));
    }

    #[tokio::test]
    async fn dangling_manager_reference_is_rejected() {
        let f = fixture().await;
        let dto = NewEmployee {
            name: "Orphan".into(),
            email: "orphan@example.com".into(),
            designation: None,
            manager_id: Some(Uuid::new_v4().to_string()),
        };
        let err = f.svc.register_employee(dto, &f.admin).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn manager_rating_refreshes_overall_cache() {
        let f = fixture().await;
        let boss = f.hire("boss", UserRole::Manager, None).await;
        let worker = f.hire("worker", UserRole::ExecutiveAssociate, Some(boss.user_id)).await;
        let k1 = f.kpi(40.0, &boss).await;
        let k2 = f.kpi(30.0, &boss).await;
        let k3 = f.kpi(30.0, &boss).await;

        f.svc.submit_manager_rating(review(worker.user_id, k1, Some(8.0)), &boss).await.unwrap();
        f.svc.submit_manager_rating(review(worker.user_id, k2, Some(6.0)), &boss).await.unwrap();

        // Self-only entry adds to the divisor without a manager rating
        let self_review = SelfReview { kpi_id: Some(k3), self_rating: Some(9.0), comments: None };
        f.svc.submit_self_rating(self_review, &worker).await.unwrap();

        let again = review(worker.user_id, k1, Some(8.0));
        let saved = f.svc.submit_manager_rating(again, &boss).await.unwrap();
        assert_eq!(saved.ratings.len(), 3);
        assert!((saved.overall_performance_rating - 14.0 / 3.0).abs() < 1e-9);

        let overall = f.svc.get_overall_rating(worker.user_id, &worker).await.unwrap();
        assert!((overall - 14.0 / 3.0).abs() < 1e-9);
        assert_eq!(saved.ratings[0].weightage, Some(40.0));
    }

    #[tokio::test]
    async fn self_rating_on_new_kpi_refreshes_stored_overall() {
        let f = fixture().await;
        let boss = f.hire("boss", UserRole::Manager, None).await;
        let worker = f.hire("worker", UserRole::ExecutiveAssociate, Some(boss.user_id)).await;
        let k1 = f.kpi(50.0, &boss).await;
        let k2 = f.kpi(50.0, &boss).await;

        let rated = f.svc.submit_manager_rating(review(worker.user_id, k1, Some(8.0)), &boss).await.unwrap();
        assert_eq!(rated.overall_performance_rating, 8.0);

        let self_review = SelfReview { kpi_id: Some(k2), self_rating: Some(7.0), comments: None };
        let response = f.svc.submit_self_rating(self_review, &worker).await.unwrap();
        assert_eq!(response.overall_performance_rating, 4.0);

        let stored = f.svc.repo.find_by_id(worker.user_id).await.unwrap();
        let overall = f.svc.get_overall_rating(worker.user_id, &worker).await.unwrap();
        assert_eq!(stored.overall_performance_rating, overall);
        assert_eq!(overall, 4.0);
    }

    #[tokio::test]
    async fn only_the_direct_manager_may_rate() {
        let f = fixture().await;
        let boss = f.hire("boss", UserRole::Manager, None).await;
        let other = f.hire("other", UserRole::Manager, None).await;
        let worker = f.hire("worker", UserRole::ExecutiveAssociate, Some(boss.user_id)).await;
        let kpi = f.kpi(50.0, &boss).await;

        let err = f
            .svc
            .submit_manager_rating(review(worker.user_id, kpi, Some(5.0)), &other)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let missing = f
            .svc
            .submit_manager_rating(review(Uuid::new_v4(), kpi, Some(5.0)), &boss)
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn counts_follow_reporting_scope() {
        let f = fixture().await;
        let ceo = f.hire("ceo", UserRole::Ceo, None).await;
        let mgr = f.hire("mgr", UserRole::Manager, Some(ceo.user_id)).await;
        let a = f.hire("assoc", UserRole::ExecutiveAssociate, Some(mgr.user_id)).await;
        f.hire("assoc2", UserRole::ExecutiveAssociate, Some(mgr.user_id)).await;

        let org = f.svc.get_employee_counts(&ceo).await.unwrap();
        assert_eq!(org.total_users, 4);
        assert_eq!(org.role_counts.get(&UserRole::ExecutiveAssociate), Some(&2));

        let team = f.svc.get_employee_counts(&mgr).await.unwrap();
        assert_eq!(team.total_users, 2);
        assert_eq!(team.role_counts.len(), 1);

        let none = f.svc.get_employee_counts(&a).await.unwrap();
        assert_eq!(none, RoleCounts::default());
    }

    #[tokio::test]
    async fn reassignment_refuses_cycles() {
        let f = fixture().await;
        let head = f.hire("head", UserRole::ProgramHead, None).await;
        let mgr = f.hire("mgr", UserRole::Manager, Some(head.user_id)).await;
        let assoc = f.hire("assoc", UserRole::ExecutiveAssociate, Some(mgr.user_id)).await;

        let err = f
            .svc
            .reassign_manager(head.user_id, Some(assoc.user_id), &f.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::HierarchyCycle { .. })));

        let moved = f.svc.reassign_manager(assoc.user_id, Some(head.user_id), &f.admin).await.unwrap();
        assert_eq!(moved.manager_id, Some(head.user_id));

        let team = f.svc.list_subordinates(head.user_id, &head).await.unwrap();
        assert_eq!(team.iter().map(|s| s.id).collect::<Vec<_>>(), vec![mgr.user_id, assoc.user_id]);
    }

    #[tokio::test]
    async fn managers_see_only_their_reports() {
        let f = fixture().await;
        let boss = f.hire("boss", UserRole::Manager, None).await;
        let other = f.hire("other", UserRole::Manager, None).await;
        let worker = f.hire("worker", UserRole::ExecutiveAssociate, Some(boss.user_id)).await;

        let page = f.svc.list_employees(None, PaginationParams::default(), &boss).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, worker.user_id);

        let err = f.svc.get_employee(worker.user_id, &other).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let mine = f.svc.get_employee(boss.user_id, &boss).await.unwrap();
        assert_eq!(mine.subordinates.map(|s| s.len()), Some(1));

        let managers = f.svc.list_managers(&worker).await.unwrap();
        assert_eq!(managers.len(), 2);
    }
}
