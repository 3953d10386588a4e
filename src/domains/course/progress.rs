use crate::domains::course::types::{
    Course, CourseAnalytics, EngagementMetrics, StudentProgress, VideoProgressUpdate,
};
use uuid::Uuid;

/// Apply a player report for `student_id`.
///
/// Enrols the student if needed and upserts their single progress entry. A
/// report counts as a view only when both progress and position are past 0.
/// Reported seconds always accumulate into `time_spent`.
pub fn record_progress(mut course: Course, student_id: Uuid, update: VideoProgressUpdate) -> Course {
    if !course.students.contains(&student_id) {
        course.students.push(student_id);
    }

    match course.progress.iter_mut().find(|p| p.student_id == student_id) {
        Some(entry) => {
            entry.video_progress = update.video_progress;
            entry.current_time = update.current_time;
        }
        None => course.progress.push(StudentProgress {
            student_id,
            video_progress: update.video_progress,
            current_time: update.current_time,
        }),
    }

    if update.video_progress > 0.0 && update.current_time > 0.0 {
        course.views += 1;
    }
    course.time_spent += update.current_time;
    course
}

/// Roll the catalogue up. `None` when there are no courses at all.
///
/// A student is complete on a course once their progress reaches
/// `completion_threshold` percent.
pub fn analytics(courses: &[Course], completion_threshold: f64) -> Option<CourseAnalytics> {
    if courses.is_empty() {
        return None;
    }

    let mut total_students = 0u64;
    let mut completed_students = 0u64;
    let mut total_views = 0u64;
    let mut total_time_spent = 0.0;

    for course in courses {
        total_students += course.students.len() as u64;
        completed_students += course
            .progress
            .iter()
            .filter(|p| p.video_progress >= completion_threshold)
            .count() as u64;
        total_views += course.views;
        total_time_spent += course.time_spent;
    }

    let (avg_completion_rate, avg_time_spent) = if total_students == 0 {
        (0.0, 0.0)
    } else {
        (
            completed_students as f64 / total_students as f64 * 100.0,
            total_time_spent / total_students as f64,
        )
    };

    Some(CourseAnalytics {
        total_students,
        completed_students,
        avg_completion_rate,
        engagement_metrics: EngagementMetrics {
            total_views,
            avg_time_spent,
        },
    })
}
