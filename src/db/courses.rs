use sqlx::{FromRow, SqlitePool};

use super::{new_id, now};
use crate::models::{
    Course, CourseWithTeacher, DEFAULT_CREDITS, NewCourseRequest, ProfileSummary, UpdateCourseRequest,
};

#[derive(Debug, FromRow)]
struct CourseTeacherRow {
    #[sqlx(flatten)]
    course: Course,
    teacher_name: Option<String>,
    teacher_email: Option<String>,
}

impl From<CourseTeacherRow> for CourseWithTeacher {
    fn from(row: CourseTeacherRow) -> Self {
        let teacher = match (&row.course.teacher_id, row.teacher_email) {
            (Some(id), Some(email)) => Some(ProfileSummary {
                id: id.clone(),
                full_name: row.teacher_name,
                email,
            }),
            _ => None,
        };
        CourseWithTeacher {
            course: row.course,
            teacher,
        }
    }
}

const COURSE_TEACHER_SELECT: &str = r#"
    SELECT c.id, c.code, c.name, c.description, c.teacher_id, c.semester, c.credits, c.created_at,
           t.full_name AS teacher_name, t.email AS teacher_email
    FROM courses c
    LEFT JOIN profiles t ON t.id = c.teacher_id
"#;

/// Courses newest first, optionally only those taught by `teacher_id`.
pub async fn fetch_courses(
    db: &SqlitePool,
    teacher_id: Option<&str>,
) -> Result<Vec<CourseWithTeacher>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CourseTeacherRow>(&format!(
        "{} WHERE (?1 IS NULL OR c.teacher_id = ?1) ORDER BY c.created_at DESC",
        COURSE_TEACHER_SELECT
    ))
    .bind(teacher_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(CourseWithTeacher::from).collect())
}

pub async fn find_course(db: &SqlitePool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, code, name, description, teacher_id, semester, credits, created_at FROM courses WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_course_with_teacher(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<CourseWithTeacher>, sqlx::Error> {
    let row = sqlx::query_as::<_, CourseTeacherRow>(&format!(
        "{} WHERE c.id = ?1",
        COURSE_TEACHER_SELECT
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row.map(CourseWithTeacher::from))
}

pub async fn insert_course(db: &SqlitePool, req: NewCourseRequest) -> Result<Course, sqlx::Error> {
    let course = Course {
        id: new_id(),
        code: req.code,
        name: req.name,
        description: req.description,
        teacher_id: req.teacher_id,
        semester: req.semester,
        credits: req.credits.unwrap_or(DEFAULT_CREDITS),
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, code, name, description, teacher_id, semester, credits, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&course.id)
    .bind(&course.code)
    .bind(&course.name)
    .bind(&course.description)
    .bind(&course.teacher_id)
    .bind(&course.semester)
    .bind(course.credits)
    .bind(&course.created_at)
    .execute(db)
    .await?;

    Ok(course)
}

pub async fn update_course(
    db: &SqlitePool,
    id: &str,
    req: UpdateCourseRequest,
) -> Result<Option<Course>, sqlx::Error> {
    let mut current = match find_course(db, id).await? {
        Some(c) => c,
        None => return Ok(None),
    };

    if let Some(code) = req.code {
        current.code = code;
    }
    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(description) = req.description {
        current.description = Some(description);
    }
    if let Some(semester) = req.semester {
        current.semester = Some(semester);
    }
    if let Some(credits) = req.credits {
        current.credits = credits;
    }

    sqlx::query(
        r#"
        UPDATE courses
        SET code = ?1,
            name = ?2,
            description = ?3,
            semester = ?4,
            credits = ?5
        WHERE id = ?6
        "#,
    )
    .bind(&current.code)
    .bind(&current.name)
    .bind(&current.description)
    .bind(&current.semester)
    .bind(current.credits)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

/// Replaces the course's teacher. A course has at most one teacher at a time.
pub async fn assign_teacher(
    db: &SqlitePool,
    id: &str,
    teacher_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    let result = sqlx::query("UPDATE courses SET teacher_id = ?1 WHERE id = ?2")
        .bind(teacher_id)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if result == 0 {
        return Ok(None);
    }
    find_course(db, id).await
}

pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn count_courses(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(db)
        .await
}
