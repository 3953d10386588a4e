use crate::auth::AuthContext;
use crate::domains::core::repository::FindById;
use crate::domains::kpi::types::{Kpi, KpiRow, NewKpi};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, SqlitePool};
use uuid::Uuid;

/// Trait defining KPI repository operations
#[async_trait]
pub trait KpiRepository: FindById<Kpi> + Send + Sync {
    async fn create(&self, new_kpi: &NewKpi, auth: &AuthContext) -> DomainResult<Kpi>;

    /// KPIs defined by `added_by`, oldest first
    async fn find_by_creator(
        &self,
        added_by: Uuid,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Kpi>>;

    /// Every KPI whose id is in `ids`; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Kpi>>;
}

/// SQLite implementation for KpiRepository
#[derive(Debug, Clone)]
pub struct SqliteKpiRepository {
    pool: SqlitePool,
}

impl SqliteKpiRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_rows(rows: Vec<KpiRow>) -> DomainResult<Vec<Kpi>> {
        rows.into_iter().map(KpiRow::into_entity).collect()
    }
}

#[async_trait]
impl FindById<Kpi> for SqliteKpiRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Kpi> {
        let row = query_as::<_, KpiRow>("SELECT * FROM kpis WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Kpi".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl KpiRepository for SqliteKpiRepository {
    async fn create(&self, new_kpi: &NewKpi, auth: &AuthContext) -> DomainResult<Kpi> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        query(
            r#"
            INSERT INTO kpis (id, name, weightage, goal, achievement, added_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new_kpi.name.trim())
        .bind(new_kpi.weightage.unwrap_or_default())
        .bind(new_kpi.goal.unwrap_or_default())
        .bind(new_kpi.achievement)
        .bind(auth.user_id.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_by_creator(
        &self,
        added_by: Uuid,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Kpi>> {
        let total: i64 = query_scalar("SELECT COUNT(*) FROM kpis WHERE added_by = ?")
            .bind(added_by.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let rows = query_as::<_, KpiRow>(
            "SELECT * FROM kpis WHERE added_by = ? ORDER BY created_at ASC LIMIT ? OFFSET ?",
        )
        .bind(added_by.to_string())
        .bind(params.limit() as i64)
        .bind(params.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(PaginatedResult::new(Self::map_rows(rows)?, total as u64, params))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Kpi>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM kpis WHERE id IN ({})", placeholders);
        let mut q = query_as::<_, KpiRow>(&sql);
        for id in ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(DbError::from)?;
        Self::map_rows(rows)
    }
}
