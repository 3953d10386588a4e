use crate::domains::core::repository::FindById;
use crate::domains::employee::types::{
    Employee, EmployeeRow, EmployeeSummary, EmployeeSummaryRow, HierarchyNode, HierarchyNodeRow,
    NewEmployee,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams, UserRole};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, SqlitePool};
use uuid::Uuid;

/// Trait defining employee repository operations
#[async_trait]
pub trait EmployeeRepository: FindById<Employee> + Send + Sync {
    async fn create(&self, new_employee: &NewEmployee) -> DomainResult<Employee>;

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Employee>>;

    /// Employees in creation order, optionally only those reporting to `manager_id`
    async fn find_all(
        &self,
        manager_id: Option<Uuid>,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Employee>>;

    async fn find_summaries_by_roles(&self, roles: &[UserRole]) -> DomainResult<Vec<EmployeeSummary>>;

    /// Employees whose id is in `ids`, in creation order; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Employee>>;

    /// Direct reports of `manager_id`, in creation order
    async fn find_direct_reports(&self, manager_id: Uuid) -> DomainResult<Vec<EmployeeSummary>>;

    /// Reporting-line projection of the whole population, in creation order
    async fn hierarchy_nodes(&self) -> DomainResult<Vec<HierarchyNode>>;

    async fn update_manager(&self, id: Uuid, manager_id: Option<Uuid>) -> DomainResult<Employee>;

    /// Overwrite the ratings document and overall-rating cache.
    ///
    /// Whole-document write: concurrent writers to the same employee race and
    /// the last save wins.
    async fn save_ratings(&self, employee: &Employee) -> DomainResult<Employee>;
}

/// SQLite implementation for EmployeeRepository
#[derive(Debug, Clone)]
pub struct SqliteEmployeeRepository {
    pool: SqlitePool,
}

impl SqliteEmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_summaries(rows: Vec<EmployeeSummaryRow>) -> DomainResult<Vec<EmployeeSummary>> {
        rows.into_iter().map(EmployeeSummaryRow::into_summary).collect()
    }
}

#[async_trait]
impl FindById<Employee> for SqliteEmployeeRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Employee> {
        let row = query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Employee".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl EmployeeRepository for SqliteEmployeeRepository {
    async fn create(&self, new_employee: &NewEmployee) -> DomainResult<Employee> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let role = new_employee.parsed_role()?;
        let manager_id = new_employee.parsed_manager_id()?;

        query(
            r#"
            INSERT INTO employees (
                id, name, email, role, manager_id, ratings, overall_performance_rating,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, '[]', 0, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new_employee.name.trim())
        .bind(new_employee.email.trim())
        .bind(role.as_str())
        .bind(manager_id.map(|m| m.to_string()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Employee>> {
        let row = query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        row.map(EmployeeRow::into_entity).transpose()
    }

    async fn find_all(
        &self,
        manager_id: Option<Uuid>,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Employee>> {
        let manager = manager_id.map(|m| m.to_string());

        let total: i64 = query_scalar(
            "SELECT COUNT(*) FROM employees WHERE (?1 IS NULL OR manager_id = ?1)",
        )
        .bind(&manager)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        let rows = query_as::<_, EmployeeRow>(
            "SELECT * FROM employees WHERE (?1 IS NULL OR manager_id = ?1)
             ORDER BY created_at ASC, rowid ASC LIMIT ?2 OFFSET ?3",
        )
        .bind(&manager)
        .bind(params.limit() as i64)
        .bind(params.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(EmployeeRow::into_entity)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total as u64, params))
    }

    async fn find_summaries_by_roles(&self, roles: &[UserRole]) -> DomainResult<Vec<EmployeeSummary>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; roles.len()].join(", ");
        let sql = format!(
            "SELECT id, name, role FROM employees WHERE role IN ({}) ORDER BY name ASC",
            placeholders
        );
        let mut q = query_as::<_, EmployeeSummaryRow>(&sql);
        for role in roles {
            q = q.bind(role.as_str());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(DbError::from)?;
        Self::map_summaries(rows)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Employee>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT * FROM employees WHERE id IN ({}) ORDER BY created_at ASC, rowid ASC",
            placeholders
        );
        let mut q = query_as::<_, EmployeeRow>(&sql);
        for id in ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(DbError::from)?;
        rows.into_iter().map(EmployeeRow::into_entity).collect()
    }

    async fn find_direct_reports(&self, manager_id: Uuid) -> DomainResult<Vec<EmployeeSummary>> {
        let rows = query_as::<_, EmployeeSummaryRow>(
            "SELECT id, name, role FROM employees WHERE manager_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(manager_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Self::map_summaries(rows)
    }

    async fn hierarchy_nodes(&self) -> DomainResult<Vec<HierarchyNode>> {
        let rows = query_as::<_, HierarchyNodeRow>(
            "SELECT id, manager_id, role FROM employees ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter().map(HierarchyNodeRow::into_node).collect()
    }

    async fn update_manager(&self, id: Uuid, manager_id: Option<Uuid>) -> DomainResult<Employee> {
        let result = query("UPDATE employees SET manager_id = ?, updated_at = ? WHERE id = ?")
            .bind(manager_id.map(|m| m.to_string()))
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Employee".to_string(), id));
        }
        self.find_by_id(id).await
    }

    async fn save_ratings(&self, employee: &Employee) -> DomainResult<Employee> {
        let ratings = serde_json::to_string(&employee.ratings)
            .map_err(|e| DomainError::Internal(format!("Failed to encode ratings: {}", e)))?;

        let result = query(
            "UPDATE employees SET ratings = ?, overall_performance_rating = ?, updated_at = ? WHERE id = ?",
        )
        .bind(ratings)
        .bind(employee.overall_performance_rating)
        .bind(Utc::now().to_rfc3339())
        .bind(employee.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Employee".to_string(), employee.id));
        }
        self.find_by_id(employee.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_migration::test_pool;
    use crate::domains::employee::types::Rating;

    fn new_employee(name: &str, role: &str, manager_id: Option<Uuid>) -> NewEmployee {
        NewEmployee {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            designation: Some(role.to_string()),
            manager_id: manager_id.map(|m| m.to_string()),
        }
    }

    #[tokio::test]
    async fn create_stores_role_label_and_empty_ratings() {
        let repo = SqliteEmployeeRepository::new(test_pool().await);
        let created = repo.create(&new_employee("Ravi Kumar", "Program Head", None)).await.unwrap();

        assert_eq!(created.role, UserRole::ProgramHead);
        assert!(created.ratings.is_empty());
        assert_eq!(created.overall_performance_rating, 0.0);

        let by_email = repo.find_by_email("ravi.kumar@example.com").await.unwrap();
        assert_eq!(by_email.map(|e| e.id), Some(created.id));
    }

    #[tokio::test]
    async fn direct_reports_and_manager_filter_agree() {
        let repo = SqliteEmployeeRepository::new(test_pool().await);
        let boss = repo.create(&new_employee("Boss One", "Manager", None)).await.unwrap();
        let a = repo.create(&new_employee("Report A", "Executives/Associates", Some(boss.id))).await.unwrap();
        let b = repo.create(&new_employee("Report B", "Executives/Associates", Some(boss.id))).await.unwrap();
        repo.create(&new_employee("Loner", "Executives/Associates", None)).await.unwrap();

        let reports = repo.find_direct_reports(boss.id).await.unwrap();
        assert_eq!(reports.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a.id, b.id]);

        let page = repo.find_all(Some(boss.id), PaginationParams::default()).await.unwrap();
        assert_eq!(page.total, 2);

        let everyone = repo.find_all(None, PaginationParams::new(1, 3)).await.unwrap();
        assert_eq!(everyone.total, 4);
        assert_eq!(everyone.items.len(), 3);
        assert_eq!(everyone.total_pages, 2);
    }

    #[tokio::test]
    async fn save_ratings_round_trips_the_document() {
        let repo = SqliteEmployeeRepository::new(test_pool().await);
        let mut employee = repo.create(&new_employee("Nisha Menon", "Manager", None)).await.unwrap();
        let kpi_id = Uuid::new_v4();
        employee.ratings.push(Rating {
            kpi_id,
            manager_rating: Some(7.0),
            ..Default::default()
        });
        employee.overall_performance_rating = 7.0;

        let saved = repo.save_ratings(&employee).await.unwrap();
        assert_eq!(saved.rating_for(kpi_id).and_then(|r| r.manager_rating), Some(7.0));
        assert_eq!(saved.overall_performance_rating, 7.0);
    }

    #[tokio::test]
    async fn update_manager_on_missing_employee_is_not_found() {
        let repo = SqliteEmployeeRepository::new(test_pool().await);
        let err = repo.update_manager(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::EntityNotFound(_, _)));
    }

    #[tokio::test]
    async fn managers_by_role() {
        let repo = SqliteEmployeeRepository::new(test_pool().await);
        repo.create(&new_employee("Zed Manager", "Manager", None)).await.unwrap();
        repo.create(&new_employee("Amy Head", "Program Head", None)).await.unwrap();
        repo.create(&new_employee("Ann Associate", "Executives/Associates", None)).await.unwrap();

        let managers = repo
            .find_summaries_by_roles(&[UserRole::Manager, UserRole::ProgramHead])
            .await
            .unwrap();
        assert_eq!(managers.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["Amy Head", "Zed Manager"]);
    }
}
