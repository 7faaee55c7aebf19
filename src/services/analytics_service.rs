use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::{courses, enrollments, events, grades, profiles};
use crate::error::AppError;
use crate::stats::analytics::{
    self, Activity, CoursePerformance, DistributionBucket, MonthlyCount, StudentPerformance,
    SystemSummary, TeacherPerformance,
};

pub const DEFAULT_TOP_STUDENTS: usize = 10;
pub const DEFAULT_TREND_MONTHS: u32 = 6;
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

/// Institution-wide figures for the professor dashboard.
pub struct AnalyticsService {
    db: SqlitePool,
}

impl AnalyticsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn summary(&self) -> Result<SystemSummary, AppError> {
        let (total_students, total_teachers, total_courses, total_enrollments, total_grades) = tokio::try_join!(
            profiles::count_students(&self.db),
            profiles::count_staff(&self.db),
            courses::count_courses(&self.db),
            enrollments::count_enrollments(&self.db),
            grades::count_grades(&self.db),
        )?;

        Ok(SystemSummary {
            total_students,
            total_teachers,
            total_courses,
            total_enrollments,
            total_grades,
        })
    }

    pub async fn grade_distribution(&self) -> Result<Vec<DistributionBucket>, AppError> {
        let all = grades::fetch_all_grades(&self.db).await?;
        Ok(analytics::grade_distribution(&all))
    }

    pub async fn top_students(&self, limit: usize) -> Result<Vec<StudentPerformance>, AppError> {
        let views = grades::fetch_grades(&self.db, None, None).await?;
        Ok(analytics::top_students(&views, limit))
    }

    pub async fn course_performance(&self) -> Result<Vec<CoursePerformance>, AppError> {
        let views = grades::fetch_grades(&self.db, None, None).await?;
        Ok(analytics::course_performance(&views))
    }

    pub async fn teacher_performance(&self) -> Result<Vec<TeacherPerformance>, AppError> {
        let (all_courses, all_enrollments, all_grades) = tokio::try_join!(
            courses::fetch_courses(&self.db, None),
            enrollments::fetch_all_enrollments(&self.db),
            grades::fetch_all_grades(&self.db),
        )?;
        Ok(analytics::teacher_performance(&all_courses, &all_enrollments, &all_grades))
    }

    pub async fn enrollment_trends(&self, months: u32) -> Result<Vec<MonthlyCount>, AppError> {
        let all = enrollments::fetch_all_enrollments(&self.db).await?;
        Ok(analytics::enrollment_trends(&all, months, Utc::now()))
    }

    pub async fn recent_activity(&self, limit: usize) -> Result<Vec<Activity>, AppError> {
        let per_source = i64::try_from(limit).unwrap_or(i64::MAX);
        let (recent_grades, recent_enrollments, recent_events) = tokio::try_join!(
            grades::fetch_recent_grades(&self.db, per_source),
            enrollments::fetch_recent_enrollments(&self.db, per_source),
            events::fetch_recent_events(&self.db, per_source),
        )?;
        Ok(analytics::recent_activity(
            &recent_grades,
            &recent_enrollments,
            &recent_events,
            limit,
        ))
    }
}
