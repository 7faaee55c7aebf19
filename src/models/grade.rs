use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Grade {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub assignment_name: Option<String>,
    pub score: f64,
    pub max_score: f64,
    pub grade_type: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

impl Grade {
    /// Score as a percentage of `max_score`; zero when `max_score` is not positive.
    pub fn percentage(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score * 100.0
        } else {
            0.0
        }
    }
}

/// Grade joined with the course headline, used by the student views.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GradeView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub grade: Grade,
    pub course_code: String,
    pub course_name: String,
    pub course_credits: i32,
    pub student_name: Option<String>,
    pub student_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGradeRequest {
    pub student_id: String,
    pub course_id: String,
    pub assignment_name: Option<String>,
    pub score: f64,
    pub max_score: f64,
    pub grade_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGradeRequest {
    pub assignment_name: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub grade_type: Option<String>,
}

pub fn validate_score(score: f64, max_score: f64) -> Result<(), AppError> {
    if !score.is_finite() || !max_score.is_finite() || max_score <= 0.0 {
        return Err(AppError::BadRequest(
            "max_score must be a positive number".to_string(),
        ));
    }
    if score < 0.0 || score > max_score {
        return Err(AppError::BadRequest(format!(
            "score {} is outside 0..={}",
            score, max_score
        )));
    }
    Ok(())
}
