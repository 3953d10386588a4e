use crate::auth::AuthContext;
use crate::domains::kpi::repository::KpiRepository;
use crate::domains::kpi::types::{KpiResponse, NewKpi};
use crate::errors::{ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams, Permission, ReportingScope};
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining KPI service operations
#[async_trait]
pub trait KpiService: Send + Sync {
    async fn add_kpi(&self, new_kpi: NewKpi, auth: &AuthContext) -> ServiceResult<KpiResponse>;

    async fn get_kpi(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<KpiResponse>;

    /// KPIs defined by `added_by`, or by the caller when `None`.
    /// Another creator's list needs organisation scope.
    async fn list_kpis(
        &self,
        added_by: Option<Uuid>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<KpiResponse>>;
}

/// Implementation of the KPI service
pub struct KpiServiceImpl {
    repo: Arc<dyn KpiRepository>,
}

impl KpiServiceImpl {
    pub fn new(repo: Arc<dyn KpiRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl KpiService for KpiServiceImpl {
    async fn add_kpi(&self, new_kpi: NewKpi, auth: &AuthContext) -> ServiceResult<KpiResponse> {
        auth.authorize(Permission::CreateKpis)?;
        new_kpi.validate()?;

        let kpi = self.repo.create(&new_kpi, auth).await?;
        log::info!("KPI {} '{}' added by {}", kpi.id, kpi.name, auth.user_id);
        Ok(KpiResponse::from(kpi))
    }

    async fn get_kpi(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<KpiResponse> {
        auth.authorize(Permission::ViewKpis)?;

        let kpi = self.repo.find_by_id(id).await.map_err(ServiceError::Domain)?;
        Ok(KpiResponse::from(kpi))
    }

    async fn list_kpis(
        &self,
        added_by: Option<Uuid>,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<KpiResponse>> {
        auth.authorize(Permission::ViewKpis)?;

        let creator = added_by.unwrap_or(auth.user_id);
        if creator != auth.user_id && auth.reporting_scope() != ReportingScope::Organization {
            return Err(ServiceError::PermissionDenied(
                "You can only list KPIs you added".to_string(),
            ));
        }
        let page = self
            .repo
            .find_by_creator(creator, params.normalized())
            .await
            .map_err(ServiceError::Domain)?;
        Ok(page.map(KpiResponse::from))
    }
}
