use crate::auth::AuthContext;
use crate::domains::core::repository::FindById;
use crate::domains::course::types::{Course, CourseFilter, CourseRow, NewCourse, PriceSort};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, SqlitePool};
use uuid::Uuid;

/// Trait defining course repository operations
#[async_trait]
pub trait CourseRepository: FindById<Course> + Send + Sync {
    async fn create(&self, new_course: &NewCourse, auth: &AuthContext) -> DomainResult<Course>;

    async fn find_page(
        &self,
        filter: &CourseFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Course>>;

    async fn find_all(&self) -> DomainResult<Vec<Course>>;

    /// Overwrite roster, progress entries and engagement counters.
    /// Whole-document write, last save wins.
    async fn save_progress(&self, course: &Course) -> DomainResult<Course>;
}

/// SQLite implementation for CourseRepository
#[derive(Debug, Clone)]
pub struct SqliteCourseRepository {
    pool: SqlitePool,
}

const FILTER_CLAUSE: &str = "WHERE (?1 IS NULL OR category = ?1)
       AND (?2 IS NULL OR (rating >= ?2 AND rating < ?2 + 1))";

impl SqliteCourseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn order_clause(sort: Option<PriceSort>) -> &'static str {
        match sort {
            Some(PriceSort::Asc) => "ORDER BY price ASC, created_at ASC",
            Some(PriceSort::Desc) => "ORDER BY price DESC, created_at ASC",
            None => "ORDER BY created_at ASC, rowid ASC",
        }
    }

    fn encode<T: serde::Serialize>(column: &str, value: &T) -> DomainResult<String> {
        serde_json::to_string(value)
            .map_err(|e| DomainError::Internal(format!("Failed to encode {}: {}", column, e)))
    }
}

#[async_trait]
impl FindById<Course> for SqliteCourseRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Course> {
        let row = query_as::<_, CourseRow>("SELECT * FROM courses WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Course".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl CourseRepository for SqliteCourseRepository {
    async fn create(&self, new_course: &NewCourse, auth: &AuthContext) -> DomainResult<Course> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let outline = Self::encode("outline", &new_course.outline)?;

        query(
            r#"
            INSERT INTO courses (
                id, title, description, price, category, instructor_id, image, video,
                outline, students, progress, rating, views, time_spent, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', '[]', 0, 0, 0, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new_course.title.trim())
        .bind(new_course.description.trim())
        .bind(new_course.price.unwrap_or_default())
        .bind(new_course.category.trim())
        .bind(auth.user_id.to_string())
        .bind(&new_course.image)
        .bind(&new_course.video)
        .bind(outline)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_page(
        &self,
        filter: &CourseFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Course>> {
        let params = params.normalized();

        let count_sql = format!("SELECT COUNT(*) FROM courses {}", FILTER_CLAUSE);
        let total: i64 = query_scalar(&count_sql)
            .bind(&filter.category)
            .bind(filter.rating)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let rows_sql = format!(
            "SELECT * FROM courses {} {} LIMIT ?3 OFFSET ?4",
            FILTER_CLAUSE,
            Self::order_clause(filter.price_sort)
        );
        let rows = query_as::<_, CourseRow>(&rows_sql)
            .bind(&filter.category)
            .bind(filter.rating)
            .bind(params.limit() as i64)
            .bind(params.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(CourseRow::into_entity)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total as u64, params))
    }

    async fn find_all(&self) -> DomainResult<Vec<Course>> {
        let rows = query_as::<_, CourseRow>("SELECT * FROM courses ORDER BY created_at ASC, rowid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        rows.into_iter().map(CourseRow::into_entity).collect()
    }

    async fn save_progress(&self, course: &Course) -> DomainResult<Course> {
        let students = Self::encode("students", &course.students)?;
        let progress = Self::encode("progress", &course.progress)?;

        let result = query(
            "UPDATE courses SET students = ?, progress = ?, views = ?, time_spent = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(students)
        .bind(progress)
        .bind(course.views as i64)
        .bind(course.time_spent)
        .bind(Utc::now().to_rfc3339())
        .bind(course.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Course".to_string(), course.id));
        }
        self.find_by_id(course.id).await
    }
}
