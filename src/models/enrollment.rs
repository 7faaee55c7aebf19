use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ProfileSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub enrolled_at: String,
}

/// Enrollment row joined with the student profile and course headline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EnrollmentView {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub enrolled_at: String,
    pub student_name: Option<String>,
    pub student_email: String,
    pub course_code: String,
    pub course_name: String,
    pub course_semester: Option<String>,
    pub course_credits: i32,
    pub teacher_id: Option<String>,
    pub teacher_name: Option<String>,
    pub teacher_email: Option<String>,
}

impl EnrollmentView {
    pub fn student(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.student_id.clone(),
            full_name: self.student_name.clone(),
            email: self.student_email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledStudent {
    pub enrollment_id: String,
    pub enrolled_at: String,
    pub student: ProfileSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollmentRequest {
    pub course_id: String,
    pub student_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEnrollRequest {
    pub student_ids: Vec<String>,
}
