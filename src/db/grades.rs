use sqlx::SqlitePool;

use super::{new_id, now};
use crate::models::{Grade, GradeView, NewGradeRequest, UpdateGradeRequest};

const GRADE_COLUMNS: &str =
    "id, student_id, course_id, assignment_name, score, max_score, grade_type, created_by, created_at";

const GRADE_VIEW_SELECT: &str = r#"
    SELECT g.id, g.student_id, g.course_id, g.assignment_name, g.score, g.max_score,
           g.grade_type, g.created_by, g.created_at,
           c.code AS course_code, c.name AS course_name, c.credits AS course_credits,
           s.full_name AS student_name, s.email AS student_email
    FROM grades g
    JOIN courses c ON c.id = g.course_id
    JOIN profiles s ON s.id = g.student_id
"#;

/// Grades newest first, optionally narrowed by student and/or course.
pub async fn fetch_grades(
    db: &SqlitePool,
    student_id: Option<&str>,
    course_id: Option<&str>,
) -> Result<Vec<GradeView>, sqlx::Error> {
    sqlx::query_as::<_, GradeView>(&format!(
        r#"{}
        WHERE (?1 IS NULL OR g.student_id = ?1)
          AND (?2 IS NULL OR g.course_id = ?2)
        ORDER BY g.created_at DESC"#,
        GRADE_VIEW_SELECT
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_course_grades(db: &SqlitePool, course_id: &str) -> Result<Vec<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "SELECT {} FROM grades WHERE course_id = ?1 ORDER BY created_at DESC",
        GRADE_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_all_grades(db: &SqlitePool) -> Result<Vec<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "SELECT {} FROM grades ORDER BY created_at DESC",
        GRADE_COLUMNS
    ))
    .fetch_all(db)
    .await
}

pub async fn fetch_recent_grades(db: &SqlitePool, limit: i64) -> Result<Vec<GradeView>, sqlx::Error> {
    sqlx::query_as::<_, GradeView>(&format!(
        "{} ORDER BY g.created_at DESC LIMIT ?1",
        GRADE_VIEW_SELECT
    ))
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn find_grade(db: &SqlitePool, id: &str) -> Result<Option<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!("SELECT {} FROM grades WHERE id = ?1", GRADE_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

fn new_grade(req: NewGradeRequest, created_by: &str, created_at: String) -> Grade {
    Grade {
        id: new_id(),
        student_id: req.student_id,
        course_id: req.course_id,
        assignment_name: req.assignment_name,
        score: req.score,
        max_score: req.max_score,
        grade_type: req.grade_type,
        created_by: created_by.to_string(),
        created_at,
    }
}

const INSERT_GRADE: &str = r#"
    INSERT INTO grades
        (id, student_id, course_id, assignment_name, score, max_score, grade_type, created_by, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

pub async fn insert_grade(
    db: &SqlitePool,
    req: NewGradeRequest,
    created_by: &str,
) -> Result<Grade, sqlx::Error> {
    let grade = new_grade(req, created_by, now());

    sqlx::query(INSERT_GRADE)
        .bind(&grade.id)
        .bind(&grade.student_id)
        .bind(&grade.course_id)
        .bind(&grade.assignment_name)
        .bind(grade.score)
        .bind(grade.max_score)
        .bind(&grade.grade_type)
        .bind(&grade.created_by)
        .bind(&grade.created_at)
        .execute(db)
        .await?;

    Ok(grade)
}

/// Inserts all grades in one transaction.
pub async fn bulk_insert_grades(
    db: &SqlitePool,
    reqs: Vec<NewGradeRequest>,
    created_by: &str,
) -> Result<Vec<Grade>, sqlx::Error> {
    let mut tx = db.begin().await?;
    let created_at = now();
    let mut created = Vec::with_capacity(reqs.len());

    for req in reqs {
        let grade = new_grade(req, created_by, created_at.clone());
        sqlx::query(INSERT_GRADE)
            .bind(&grade.id)
            .bind(&grade.student_id)
            .bind(&grade.course_id)
            .bind(&grade.assignment_name)
            .bind(grade.score)
            .bind(grade.max_score)
            .bind(&grade.grade_type)
            .bind(&grade.created_by)
            .bind(&grade.created_at)
            .execute(&mut *tx)
            .await?;
        created.push(grade);
    }

    tx.commit().await?;
    Ok(created)
}

/// Applies the changed fields to `current` and stores it.
pub async fn update_grade(
    db: &SqlitePool,
    mut current: Grade,
    req: UpdateGradeRequest,
) -> Result<Grade, sqlx::Error> {
    if let Some(name) = req.assignment_name {
        current.assignment_name = Some(name);
    }
    if let Some(score) = req.score {
        current.score = score;
    }
    if let Some(max_score) = req.max_score {
        current.max_score = max_score;
    }
    if let Some(grade_type) = req.grade_type {
        current.grade_type = Some(grade_type);
    }

    sqlx::query(
        r#"
        UPDATE grades
        SET assignment_name = ?1,
            score = ?2,
            max_score = ?3,
            grade_type = ?4
        WHERE id = ?5
        "#,
    )
    .bind(&current.assignment_name)
    .bind(current.score)
    .bind(current.max_score)
    .bind(&current.grade_type)
    .bind(&current.id)
    .execute(db)
    .await?;

    Ok(current)
}

pub async fn delete_grade(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM grades WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn count_grades(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM grades")
        .fetch_one(db)
        .await
}
