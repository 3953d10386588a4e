use crate::auth::AuthContext;
use crate::domains::core::repository::FindById;
use crate::domains::performance::report::project;
use crate::domains::performance::types::{
    NewPerformance, PerformanceFilter, PerformanceJoinRow, PerformanceRecord, PerformanceReportRow,
    PerformanceRow,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, SqlitePool};
use uuid::Uuid;

/// Trait defining performance record repository operations
#[async_trait]
pub trait PerformanceRepository: FindById<PerformanceRecord> + Send + Sync {
    async fn create(&self, new_record: &NewPerformance, auth: &AuthContext) -> DomainResult<PerformanceRecord>;

    async fn update_employee_achievement(
        &self,
        id: Uuid,
        emp_achievement: &str,
    ) -> DomainResult<PerformanceRecord>;

    /// Raw records about any of `employee_ids`, oldest first
    async fn find_by_employees(&self, employee_ids: &[Uuid]) -> DomainResult<Vec<PerformanceRecord>>;

    /// One page of joined report rows.
    ///
    /// `total` is counted over the same join and filter as the rows, so
    /// records whose KPI or employee no longer resolves are not counted.
    async fn find_report_page(
        &self,
        filter: PerformanceFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<PerformanceReportRow>>;
}

/// SQLite implementation for PerformanceRepository
#[derive(Debug, Clone)]
pub struct SqlitePerformanceRepository {
    pool: SqlitePool,
}

const REPORT_JOIN: &str = "FROM performances p
     INNER JOIN kpis k ON k.id = p.kpi_id
     INNER JOIN employees e ON e.id = p.employee_id";

impl SqlitePerformanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FindById<PerformanceRecord> for SqlitePerformanceRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<PerformanceRecord> {
        let row = query_as::<_, PerformanceRow>("SELECT * FROM performances WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Performance".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl PerformanceRepository for SqlitePerformanceRepository {
    async fn create(&self, new_record: &NewPerformance, auth: &AuthContext) -> DomainResult<PerformanceRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        let kpi_id = new_record
            .kpi_id
            .ok_or_else(|| DomainError::Internal("create called without kpi_id".to_string()))?;
        let employee_id = new_record
            .employee_id
            .ok_or_else(|| DomainError::Internal("create called without employee_id".to_string()))?;

        query(
            r#"
            INSERT INTO performances (
                id, kpi_id, employee_id, added_by, weightage, goal,
                manager_achievement, emp_achievement, remarks, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, '', ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(kpi_id.to_string())
        .bind(employee_id.to_string())
        .bind(auth.user_id.to_string())
        .bind(new_record.weightage.unwrap_or_default())
        .bind(new_record.goal.unwrap_or_default())
        .bind(new_record.manager_achievement.as_deref().unwrap_or("").trim())
        .bind(new_record.remarks.trim())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update_employee_achievement(
        &self,
        id: Uuid,
        emp_achievement: &str,
    ) -> DomainResult<PerformanceRecord> {
        let result = query("UPDATE performances SET emp_achievement = ?, updated_at = ? WHERE id = ?")
            .bind(emp_achievement.trim())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Performance".to_string(), id));
        }
        self.find_by_id(id).await
    }

    async fn find_by_employees(&self, employee_ids: &[Uuid]) -> DomainResult<Vec<PerformanceRecord>> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; employee_ids.len()].join(", ");
        let sql = format!(
            "SELECT * FROM performances WHERE employee_id IN ({}) ORDER BY created_at ASC, rowid ASC",
            placeholders
        );
        let mut q = query_as::<_, PerformanceRow>(&sql);
        for id in employee_ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(DbError::from)?;
        rows.into_iter().map(PerformanceRow::into_entity).collect()
    }

    async fn find_report_page(
        &self,
        filter: PerformanceFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<PerformanceReportRow>> {
        let params = params.normalized();
        let key = filter.key().to_string();

        let count_sql = format!("SELECT COUNT(*) {} WHERE p.{} = ?", REPORT_JOIN, filter.column());
        let total: i64 = query_scalar(&count_sql)
            .bind(&key)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let rows_sql = format!(
            "SELECT p.*, k.name AS kpi_name, e.name AS employee_name, e.role AS employee_role
             {} WHERE p.{} = ?
             ORDER BY p.created_at ASC, p.rowid ASC LIMIT ? OFFSET ?",
            REPORT_JOIN,
            filter.column()
        );
        let rows = query_as::<_, PerformanceJoinRow>(&rows_sql)
            .bind(&key)
            .bind(params.limit() as i64)
            .bind(params.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| {
                let (record, kpi_name, employee_name, role) = row.into_parts()?;
                Ok(project(&record, &kpi_name, &employee_name, role))
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total as u64, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_migration::test_pool;
    use crate::domains::employee::repository::{EmployeeRepository, SqliteEmployeeRepository};
    use crate::domains::employee::types::NewEmployee;
    use crate::domains::kpi::repository::{KpiRepository, SqliteKpiRepository};
    use crate::domains::kpi::types::NewKpi;
    use crate::types::UserRole;

    struct Seed {
        repo: SqlitePerformanceRepository,
        manager: AuthContext,
        employee_id: Uuid,
        kpi_id: Uuid,
    }

    async fn seed() -> Seed {
        let pool = test_pool().await;
        let employees = SqliteEmployeeRepository::new(pool.clone());
        let kpis = SqliteKpiRepository::new(pool.clone());

        let boss = employees
            .create(&NewEmployee {
                name: "Boss".into(),
                email: "boss@example.com".into(),
                designation: Some("Manager".into()),
                manager_id: None,
            })
            .await
            .unwrap();
        let worker = employees
            .create(&NewEmployee {
                name: "Worker".into(),
                email: "worker@example.com".into(),
                designation: None,
                manager_id: Some(boss.id.to_string()),
            })
            .await
            .unwrap();
        let manager = AuthContext::new(boss.id, UserRole::Manager);
        let kpi = kpis
            .create(
                &NewKpi {
                    name: "Enrolments".into(),
                    weightage: Some(50.0),
                    goal: Some(100.0),
                    achievement: None,
                },
                &manager,
            )
            .await
            .unwrap();

        Seed {
            repo: SqlitePerformanceRepository::new(pool),
            manager,
            employee_id: worker.id,
            kpi_id: kpi.id,
        }
    }

    fn new_record(kpi_id: Uuid, employee_id: Uuid, achievement: &str) -> NewPerformance {
        NewPerformance {
            kpi_id: Some(kpi_id),
            employee_id: Some(employee_id),
            weightage: Some(50.0),
            goal: Some(100.0),
            manager_achievement: Some(achievement.to_string()),
            remarks: "monthly check-in".into(),
        }
    }

    #[tokio::test]
    async fn report_row_carries_computed_average() {
        let s = seed().await;
        s.repo.create(&new_record(s.kpi_id, s.employee_id, "80"), &s.manager).await.unwrap();

        let page = s
            .repo
            .find_report_page(PerformanceFilter::AddedBy(s.manager.user_id), PaginationParams::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        let row = &page.items[0];
        assert!((row.average - 4.0).abs() < 1e-9);
        assert_eq!(row.employee_name, "Worker");
        assert_eq!(row.employee_role, UserRole::ExecutiveAssociate);
        assert_eq!(row.kpi_name, "Enrolments");
    }

    #[tokio::test]
    async fn third_page_of_twenty_five() {
        let s = seed().await;
        for _ in 0..25 {
            s.repo.create(&new_record(s.kpi_id, s.employee_id, "10"), &s.manager).await.unwrap();
        }

        let page = s
            .repo
            .find_report_page(PerformanceFilter::AddedBy(s.manager.user_id), PaginationParams::new(3, 10))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn orphaned_records_are_neither_listed_nor_counted() {
        let s = seed().await;
        s.repo.create(&new_record(s.kpi_id, s.employee_id, "50"), &s.manager).await.unwrap();
        s.repo.create(&new_record(Uuid::new_v4(), s.employee_id, "50"), &s.manager).await.unwrap();
        s.repo.create(&new_record(s.kpi_id, Uuid::new_v4(), "50"), &s.manager).await.unwrap();

        let page = s
            .repo
            .find_report_page(PerformanceFilter::AddedBy(s.manager.user_id), PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 1);

        // Raw access still sees both records about the real employee
        let raw = s.repo.find_by_employees(&[s.employee_id]).await.unwrap();
        assert_eq!(raw.len(), 2);
    }

    #[tokio::test]
    async fn employee_achievement_is_independent_of_manager_value() {
        let s = seed().await;
        let created = s.repo.create(&new_record(s.kpi_id, s.employee_id, ""), &s.manager).await.unwrap();
        assert_eq!(created.emp_achievement, "");

        let updated = s.repo.update_employee_achievement(created.id, " 65 ").await.unwrap();
        assert_eq!(updated.emp_achievement, "65");
        assert_eq!(updated.manager_achievement, "");

        let page = s
            .repo
            .find_report_page(PerformanceFilter::Employee(s.employee_id), PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.items[0].emp_achievement, Some(65.0));
        assert_eq!(page.items[0].manager_achievement, None);
        assert_eq!(page.items[0].average, 0.0);
    }
}
