use crate::auth::AuthContext;
use crate::domains::course::progress::{analytics, record_progress};
use crate::domains::course::repository::CourseRepository;
use crate::domains::course::types::{Course, CourseAnalytics, CourseFilter, NewCourse, VideoProgressUpdate};
use crate::errors::{DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining course service operations
#[async_trait]
pub trait CourseService: Send + Sync {
    async fn create_course(&self, new_course: NewCourse, auth: &AuthContext) -> ServiceResult<Course>;

    async fn get_course(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<Course>;

    async fn list_courses(
        &self,
        filter: CourseFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<Course>>;

    /// Record the caller's own playback position on a course
    async fn update_video_progress(
        &self,
        course_id: Uuid,
        update: VideoProgressUpdate,
        auth: &AuthContext,
    ) -> ServiceResult<Course>;

    async fn get_analytics(&self, auth: &AuthContext) -> ServiceResult<CourseAnalytics>;
}

/// Implementation of the course service
pub struct CourseServiceImpl {
    repo: Arc<dyn CourseRepository>,
    completion_threshold: f64,
}

impl CourseServiceImpl {
    pub fn new(repo: Arc<dyn CourseRepository>, completion_threshold: f64) -> Self {
        Self { repo, completion_threshold }
    }
}

#[async_trait]
impl CourseService for CourseServiceImpl {
    async fn create_course(&self, new_course: NewCourse, auth: &AuthContext) -> ServiceResult<Course> {
        auth.authorize(Permission::ManageCourses)?;
        new_course.validate()?;

        let course = self.repo.create(&new_course, auth).await?;
        log::info!("Course {} '{}' created by {}", course.id, course.title, auth.user_id);
        Ok(course)
    }

    async fn get_course(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<Course> {
        auth.authorize(Permission::ViewCourses)?;
        self.repo.find_by_id(id).await.map_err(ServiceError::Domain)
    }

    async fn list_courses(
        &self,
        filter: CourseFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<Course>> {
        auth.authorize(Permission::ViewCourses)?;
        Ok(self.repo.find_page(&filter, params).await?)
    }

    async fn update_video_progress(
        &self,
        course_id: Uuid,
        update: VideoProgressUpdate,
        auth: &AuthContext,
    ) -> ServiceResult<Course> {
        auth.authorize(Permission::TrackCourseProgress)?;
        update.validate()?;

        let course = self.repo.find_by_id(course_id).await.map_err(ServiceError::Domain)?;
        let updated = record_progress(course, auth.user_id, update);
        let saved = self.repo.save_progress(&updated).await?;

        log::debug!(
            "Progress {:.1}% at {}s on course {} for {}",
            update.video_progress,
            update.current_time,
            course_id,
            auth.user_id
        );
        Ok(saved)
    }

    async fn get_analytics(&self, auth: &AuthContext) -> ServiceResult<CourseAnalytics> {
        auth.authorize(Permission::ViewCourseAnalytics)?;

        let courses = self.repo.find_all().await?;
        analytics(&courses, self.completion_threshold)
            .ok_or_else(|| ServiceError::Domain(DomainError::NoRecords("Course".to_string())))
    }
}
