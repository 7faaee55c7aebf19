use sqlx::SqlitePool;

use super::{new_id, now};
use crate::models::{Enrollment, EnrollmentView};

const ENROLLMENT_VIEW_SELECT: &str = r#"
    SELECT e.id, e.student_id, e.course_id, e.enrolled_at,
           s.full_name AS student_name, s.email AS student_email,
           c.code AS course_code, c.name AS course_name,
           c.semester AS course_semester, c.credits AS course_credits,
           c.teacher_id, t.full_name AS teacher_name, t.email AS teacher_email
    FROM enrollments e
    JOIN profiles s ON s.id = e.student_id
    JOIN courses c ON c.id = e.course_id
    LEFT JOIN profiles t ON t.id = c.teacher_id
"#;

/// Enrollments newest first, optionally restricted to one course.
pub async fn fetch_enrollments(
    db: &SqlitePool,
    course_id: Option<&str>,
) -> Result<Vec<EnrollmentView>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentView>(&format!(
        "{} WHERE (?1 IS NULL OR e.course_id = ?1) ORDER BY e.enrolled_at DESC",
        ENROLLMENT_VIEW_SELECT
    ))
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_student_enrollments(
    db: &SqlitePool,
    student_id: &str,
) -> Result<Vec<EnrollmentView>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentView>(&format!(
        "{} WHERE e.student_id = ?1 ORDER BY e.enrolled_at DESC",
        ENROLLMENT_VIEW_SELECT
    ))
    .bind(student_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_recent_enrollments(
    db: &SqlitePool,
    limit: i64,
) -> Result<Vec<EnrollmentView>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentView>(&format!(
        "{} ORDER BY e.enrolled_at DESC LIMIT ?1",
        ENROLLMENT_VIEW_SELECT
    ))
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn fetch_all_enrollments(db: &SqlitePool) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        "SELECT id, student_id, course_id, enrolled_at FROM enrollments ORDER BY enrolled_at ASC",
    )
    .fetch_all(db)
    .await
}

pub async fn find_enrollment(
    db: &SqlitePool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        "SELECT id, student_id, course_id, enrolled_at FROM enrollments WHERE student_id = ?1 AND course_id = ?2",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_enrollment(
    db: &SqlitePool,
    course_id: &str,
    student_id: &str,
) -> Result<Enrollment, sqlx::Error> {
    let enrollment = Enrollment {
        id: new_id(),
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        enrolled_at: now(),
    };

    sqlx::query(
        "INSERT INTO enrollments (id, student_id, course_id, enrolled_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&enrollment.id)
    .bind(&enrollment.student_id)
    .bind(&enrollment.course_id)
    .bind(&enrollment.enrolled_at)
    .execute(db)
    .await?;

    Ok(enrollment)
}

/// Enrolls every student in one transaction; a duplicate rolls back the batch.
pub async fn bulk_insert_enrollments(
    db: &SqlitePool,
    course_id: &str,
    student_ids: &[String],
) -> Result<Vec<Enrollment>, sqlx::Error> {
    let mut tx = db.begin().await?;
    let mut created = Vec::with_capacity(student_ids.len());
    let enrolled_at = now();

    for student_id in student_ids {
        let enrollment = Enrollment {
            id: new_id(),
            student_id: student_id.clone(),
            course_id: course_id.to_string(),
            enrolled_at: enrolled_at.clone(),
        };
        sqlx::query(
            "INSERT INTO enrollments (id, student_id, course_id, enrolled_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&enrollment.id)
        .bind(&enrollment.student_id)
        .bind(&enrollment.course_id)
        .bind(&enrollment.enrolled_at)
        .execute(&mut *tx)
        .await?;
        created.push(enrollment);
    }

    tx.commit().await?;
    Ok(created)
}

/// Removes the enrollment together with the student's grades in that course.
pub async fn delete_enrollment(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    let pair: Option<(String, String)> =
        sqlx::query_as("SELECT student_id, course_id FROM enrollments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((student_id, course_id)) = pair else {
        return Ok(false);
    };

    sqlx::query("DELETE FROM grades WHERE student_id = ?1 AND course_id = ?2")
        .bind(&student_id)
        .bind(&course_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM enrollments WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn count_enrollments(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
        .fetch_one(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, courses, profiles};
    use crate::models::{NewCourseRequest, NewProfileRequest, UserRole};

    async fn setup_test_db() -> (SqlitePool, String) {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        for (id, role) in [
            ("t1", UserRole::Teacher),
            ("s1", UserRole::Student),
            ("s2", UserRole::Student),
        ] {
            profiles::insert_profile(
                &pool,
                NewProfileRequest {
                    id: id.to_string(),
                    email: format!("{}@example.com", id),
                    role: Some(role),
                    full_name: Some(id.to_uppercase()),
                    phone: None,
                },
            )
            .await
            .expect("Failed to insert profile");
        }
        let course = courses::insert_course(
            &pool,
            NewCourseRequest {
                code: "HIST200".to_string(),
                name: "African History".to_string(),
                description: None,
                teacher_id: Some("t1".to_string()),
                semester: Some("2026-S1".to_string()),
                credits: Some(3),
            },
        )
        .await
        .expect("Failed to insert course");
        (pool, course.id)
    }

    #[tokio::test]
    async fn test_enroll_and_list() {
        let (pool, course_id) = setup_test_db().await;

        let enrollment = insert_enrollment(&pool, &course_id, "s1")
            .await
            .expect("Failed to enroll");
        assert_eq!(enrollment.student_id, "s1");

        let views = fetch_enrollments(&pool, Some(&course_id)).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].student_email, "s1@example.com");
        assert_eq!(views[0].course_code, "HIST200");
        assert_eq!(views[0].teacher_email.as_deref(), Some("t1@example.com"));

        let mine = fetch_student_enrollments(&pool, "s1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(fetch_student_enrollments(&pool, "s2").await.unwrap().is_empty());
        assert!(find_enrollment(&pool, "s1", &course_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_is_unique_violation() {
        let (pool, course_id) = setup_test_db().await;
        insert_enrollment(&pool, &course_id, "s1").await.unwrap();

        let err = insert_enrollment(&pool, &course_id, "s1")
            .await
            .expect_err("duplicate must fail");
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bulk_enroll_rolls_back_on_duplicate() {
        let (pool, course_id) = setup_test_db().await;
        insert_enrollment(&pool, &course_id, "s2").await.unwrap();

        let result = bulk_insert_enrollments(
            &pool,
            &course_id,
            &["s1".to_string(), "s2".to_string()],
        )
        .await;
        assert!(result.is_err());
        assert_eq!(count_enrollments(&pool).await.unwrap(), 1);

        let created = bulk_insert_enrollments(&pool, &course_id, &["s1".to_string()])
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(count_enrollments(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unenroll_and_course_cascade() {
        let (pool, course_id) = setup_test_db().await;
        let e1 = insert_enrollment(&pool, &course_id, "s1").await.unwrap();
        insert_enrollment(&pool, &course_id, "s2").await.unwrap();

        assert!(delete_enrollment(&pool, &e1.id).await.unwrap());
        assert!(!delete_enrollment(&pool, &e1.id).await.unwrap());
        assert_eq!(count_enrollments(&pool).await.unwrap(), 1);

        courses::delete_course(&pool, &course_id).await.unwrap();
        assert_eq!(count_enrollments(&pool).await.unwrap(), 0);
    }
}
