use sqlx::SqlitePool;
use tracing::info;

use crate::db::{enrollments, grades};
use crate::error::AppError;
use crate::models::{Grade, NewGradeRequest, UpdateGradeRequest, validate_score};

/// Records grades, rejecting scores out of range and students not enrolled in the course.
pub struct GradeService {
    db: SqlitePool,
}

impl GradeService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn check(&self, req: &NewGradeRequest) -> Result<(), AppError> {
        validate_score(req.score, req.max_score)?;
        let enrolled = enrollments::find_enrollment(&self.db, &req.student_id, &req.course_id).await?;
        if enrolled.is_none() {
            return Err(AppError::BadRequest(format!(
                "student {} is not enrolled in course {}",
                req.student_id, req.course_id
            )));
        }
        Ok(())
    }

    pub async fn record(&self, req: NewGradeRequest, created_by: &str) -> Result<Grade, AppError> {
        self.check(&req).await?;
        let grade = grades::insert_grade(&self.db, req, created_by).await?;
        info!(
            "Recorded grade {} for student {} in course {}",
            grade.id, grade.student_id, grade.course_id
        );
        Ok(grade)
    }

    /// All-or-nothing: one invalid entry rejects the whole batch.
    pub async fn record_bulk(
        &self,
        reqs: Vec<NewGradeRequest>,
        created_by: &str,
    ) -> Result<Vec<Grade>, AppError> {
        if reqs.is_empty() {
            return Err(AppError::BadRequest("no grades given".to_string()));
        }
        for req in &reqs {
            self.check(req).await?;
        }
        let created = grades::bulk_insert_grades(&self.db, reqs, created_by).await?;
        info!("Recorded {} grades", created.len());
        Ok(created)
    }

    pub async fn revise(&self, id: &str, req: UpdateGradeRequest) -> Result<Grade, AppError> {
        let current = grades::find_grade(&self.db, id)
            .await?
            .ok_or(AppError::NotFound)?;
        validate_score(
            req.score.unwrap_or(current.score),
            req.max_score.unwrap_or(current.max_score),
        )?;
        let grade = grades::update_grade(&self.db, current, req).await?;
        info!("Updated grade {}", grade.id);
        Ok(grade)
    }

    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        if grades::delete_grade(&self.db, id).await? {
            info!("Deleted grade {}", id);
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
