use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ProfileSummary;

pub const DEFAULT_CREDITS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub teacher_id: Option<String>,
    pub semester: Option<String>,
    pub credits: i32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseWithTeacher {
    #[serde(flatten)]
    pub course: Course,
    pub teacher: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub teacher: Option<ProfileSummary>,
    pub enrollments: Vec<super::EnrolledStudent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub teacher_id: Option<String>,
    pub semester: Option<String>,
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourseRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub semester: Option<String>,
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTeacherRequest {
    pub teacher_id: String,
}
