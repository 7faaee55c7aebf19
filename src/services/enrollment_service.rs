use sqlx::SqlitePool;
use tracing::info;

use crate::db::{courses, enrollments, profiles};
use crate::error::{AppError, conflict_on_unique};
use crate::models::{Enrollment, UserRole};

pub struct EnrollmentService {
    db: SqlitePool,
}

impl EnrollmentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn check_course(&self, course_id: &str) -> Result<(), AppError> {
        courses::find_course(&self.db, course_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(())
    }

    async fn check_student(&self, student_id: &str) -> Result<(), AppError> {
        match profiles::find_profile(&self.db, student_id).await? {
            Some(p) if p.role == UserRole::Student => Ok(()),
            Some(_) => Err(AppError::BadRequest(format!("{} is not a student", student_id))),
            None => Err(AppError::BadRequest(format!("unknown student {}", student_id))),
        }
    }

    pub async fn enroll(&self, course_id: &str, student_id: &str) -> Result<Enrollment, AppError> {
        self.check_course(course_id).await?;
        self.check_student(student_id).await?;
        let enrollment = enrollments::insert_enrollment(&self.db, course_id, student_id)
            .await
            .map_err(|e| conflict_on_unique(e, "student is already enrolled in this course"))?;
        info!("Enrolled student {} in course {}", student_id, course_id);
        Ok(enrollment)
    }

    /// Enrolls several students at once; any duplicate rejects the batch with 409.
    pub async fn enroll_many(
        &self,
        course_id: &str,
        student_ids: &[String],
    ) -> Result<Vec<Enrollment>, AppError> {
        if student_ids.is_empty() {
            return Err(AppError::BadRequest("no students given".to_string()));
        }
        self.check_course(course_id).await?;
        for student_id in student_ids {
            self.check_student(student_id).await?;
        }
        let created = enrollments::bulk_insert_enrollments(&self.db, course_id, student_ids)
            .await
            .map_err(|e| conflict_on_unique(e, "a student is already enrolled in this course"))?;
        info!("Enrolled {} students in course {}", created.len(), course_id);
        Ok(created)
    }

    pub async fn unenroll(&self, id: &str) -> Result<(), AppError> {
        if enrollments::delete_enrollment(&self.db, id).await? {
            info!("Removed enrollment {}", id);
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, grades};
    use crate::models::{NewCourseRequest, NewGradeRequest, NewProfileRequest};

    async fn setup() -> (EnrollmentService, String) {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        for (id, role) in [("t1", UserRole::Teacher), ("s1", UserRole::Student), ("s2", UserRole::Student)] {
            profiles::insert_profile(
                &pool,
                NewProfileRequest {
                    id: id.to_string(),
                    email: format!("{}@example.com", id),
                    role: Some(role),
                    full_name: None,
                    phone: None,
                },
            )
            .await
            .unwrap();
        }
        let course = courses::insert_course(
            &pool,
            NewCourseRequest {
                code: "GEO101".to_string(),
                name: "Geography".to_string(),
                description: None,
                teacher_id: Some("t1".to_string()),
                semester: None,
                credits: None,
            },
        )
        .await
        .unwrap();
        (EnrollmentService::new(pool), course.id)
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_conflicts() {
        let (service, course_id) = setup().await;
        service.enroll(&course_id, "s1").await.unwrap();
        assert!(matches!(
            service.enroll(&course_id, "s1").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_missing_course_and_non_students() {
        let (service, course_id) = setup().await;
        assert!(matches!(service.enroll("missing", "s1").await, Err(AppError::NotFound)));
        assert!(matches!(service.enroll(&course_id, "t1").await, Err(AppError::BadRequest(_))));
        assert!(matches!(service.enroll(&course_id, "ghost").await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_enroll_many_and_unenroll() {
        let (service, course_id) = setup().await;
        let created = service
            .enroll_many(&course_id, &["s1".to_string(), "s2".to_string()])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);

        assert!(matches!(
            service.enroll_many(&course_id, &["s1".to_string()]).await,
            Err(AppError::Conflict(_))
        ));

        service.unenroll(&created[0].id).await.unwrap();
        assert!(matches!(service.unenroll(&created[0].id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_unenroll_removes_course_grades() {
        let (service, course_id) = setup().await;
        let created = service
            .enroll_many(&course_id, &["s1".to_string(), "s2".to_string()])
            .await
            .unwrap();
        for student in ["s1", "s2"] {
            grades::insert_grade(
                &service.db,
                NewGradeRequest {
                    student_id: student.to_string(),
                    course_id: course_id.clone(),
                    assignment_name: Some("Quiz 1".to_string()),
                    score: 90.0,
                    max_score: 100.0,
                    grade_type: None,
                },
                "t1",
            )
            .await
            .unwrap();
        }

        service.unenroll(&created[0].id).await.unwrap();

        let left = grades::fetch_grades(&service.db, None, Some(&course_id)).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].grade.student_id, "s2");
    }
}
