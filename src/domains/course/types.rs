use crate::domains::employee::types::parse_datetime;
use crate::errors::{DomainError, DomainResult};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub title: String,
    pub description: Option<String>,
}

/// How far one student has got through the course video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgress {
    pub student_id: Uuid,
    /// Percentage of the video watched
    pub video_progress: f64,
    /// Playback position in seconds
    pub current_time: f64,
}

/// Training course entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub instructor_id: Uuid,
    pub image: Option<String>,
    pub video: Option<String>,
    pub outline: Vec<OutlineItem>,
    pub students: Vec<Uuid>,
    pub progress: Vec<StudentProgress>,
    pub rating: f64,
    pub views: u64,
    pub time_spent: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn progress_for(&self, student_id: Uuid) -> Option<&StudentProgress> {
        self.progress.iter().find(|p| p.student_id == student_id)
    }
}

/// NewCourse DTO. Media paths are wherever the upload layer stored the files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub category: String,
    pub image: Option<String>,
    pub video: Option<String>,
    #[serde(default)]
    pub outline: Vec<OutlineItem>,
}

impl Validate for NewCourse {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("title", Some(self.title.clone()))
            .required()
            .not_blank()
            .max_length(200)
            .validate()?;

        ValidationBuilder::new("description", Some(self.description.clone()))
            .required()
            .not_blank()
            .validate()?;

        ValidationBuilder::new("price", self.price)
            .required()
            .finite()
            .min(0.0)
            .validate()?;

        ValidationBuilder::new("category", Some(self.category.clone()))
            .required()
            .not_blank()
            .validate()?;

        for item in &self.outline {
            ValidationBuilder::new("outline.title", Some(item.title.clone()))
                .required()
                .not_blank()
                .validate()?;
        }
        Ok(())
    }
}

/// Progress report sent by the video player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoProgressUpdate {
    pub video_progress: f64,
    pub current_time: f64,
}

impl Validate for VideoProgressUpdate {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("video_progress", Some(self.video_progress))
            .finite()
            .range(0.0, 100.0)
            .validate()?;
        ValidationBuilder::new("current_time", Some(self.current_time))
            .finite()
            .min(0.0)
            .validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSort {
    Asc,
    Desc,
}

impl PriceSort {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(PriceSort::Asc),
            "desc" => Some(PriceSort::Desc),
            _ => None,
        }
    }
}

/// Catalogue filter. `rating` selects the band `[rating, rating + 1)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub price_sort: Option<PriceSort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub total_views: u64,
    pub avg_time_spent: f64,
}

/// Catalogue-wide completion and engagement figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_students: u64,
    pub completed_students: u64,
    pub avg_completion_rate: f64,
    pub engagement_metrics: EngagementMetrics,
}

#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub instructor_id: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub outline: String,
    pub students: String,
    pub progress: String,
    pub rating: f64,
    pub views: i64,
    pub time_spent: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl CourseRow {
    pub fn into_entity(self) -> DomainResult<Course> {
        let id = Uuid::parse_str(&self.id).map_err(|_| DomainError::InvalidUuid(self.id.clone()))?;
        let decode_err = |column: &str, e: serde_json::Error| {
            DomainError::Internal(format!("Invalid {} document for course {}: {}", column, id, e))
        };

        Ok(Course {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            category: self.category,
            instructor_id: Uuid::parse_str(&self.instructor_id)
                .map_err(|_| DomainError::InvalidUuid(self.instructor_id.clone()))?,
            image: self.image,
            video: self.video,
            outline: serde_json::from_str(&self.outline).map_err(|e| decode_err("outline", e))?,
            students: serde_json::from_str(&self.students).map_err(|e| decode_err("students", e))?,
            progress: serde_json::from_str(&self.progress).map_err(|e| decode_err("progress", e))?,
            rating: self.rating,
            views: self.views.max(0) as u64,
            time_spent: self.time_spent,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}
