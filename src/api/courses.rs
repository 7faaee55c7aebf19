use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use crate::db::{courses, enrollments, profiles};
use crate::error::AppError;
use crate::models::*;
use crate::services::{Actor, EnrollmentService, ReportService};
use crate::state::AppState;
use crate::stats::{ClassReport, CourseReportSummary};

async fn load_course(state: &AppState, id: &str) -> Result<Course, AppError> {
    courses::find_course(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// The profile must exist and be allowed to teach.
async fn check_teacher(state: &AppState, teacher_id: &str) -> Result<(), AppError> {
    match profiles::find_profile(&state.db, teacher_id).await? {
        Some(p) if p.role.is_staff() => Ok(()),
        Some(_) => Err(AppError::BadRequest(format!("{} cannot teach a course", teacher_id))),
        None => Err(AppError::BadRequest(format!("unknown teacher {}", teacher_id))),
    }
}

fn check_fields(code: &str, name: &str, credits: Option<i32>) -> Result<(), AppError> {
    if code.trim().is_empty() || name.trim().is_empty() {
        return Err(AppError::BadRequest("course code and name are required".to_string()));
    }
    if credits.is_some_and(|c| c <= 0) {
        return Err(AppError::BadRequest("credits must be positive".to_string()));
    }
    Ok(())
}

pub async fn list_courses(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<CourseWithTeacher>>, AppError> {
    let list = courses::fetch_courses(&state.db, actor.teacher_scope()).await?;
    Ok(Json(list))
}

pub async fn create_course(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    actor.require_professor()?;
    check_fields(&req.code, &req.name, req.credits)?;
    if let Some(teacher_id) = &req.teacher_id {
        check_teacher(&state, teacher_id).await?;
    }
    let course = courses::insert_course(&state.db, req).await?;
    info!("Created course {} ({})", course.code, course.id);
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn get_course(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<CourseDetail>, AppError> {
    let entry = courses::find_course_with_teacher(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let roster = enrollments::fetch_enrollments(&state.db, Some(&id)).await?;

    Ok(Json(CourseDetail {
        course: entry.course,
        teacher: entry.teacher,
        enrollments: roster
            .into_iter()
            .map(|e| EnrolledStudent {
                student: e.student(),
                enrollment_id: e.id,
                enrolled_at: e.enrolled_at,
            })
            .collect(),
    }))
}

pub async fn update_course(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = load_course(&state, &id).await?;
    actor.require_course_owner(&course)?;
    check_fields(
        req.code.as_deref().unwrap_or(&course.code),
        req.name.as_deref().unwrap_or(&course.name),
        req.credits,
    )?;
    let updated = courses::update_course(&state.db, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    info!("Updated course {}", id);
    Ok(Json(updated))
}

pub async fn delete_course(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let course = load_course(&state, &id).await?;
    actor.require_course_owner(&course)?;
    if courses::delete_course(&state.db, &id).await? {
        info!("Deleted course {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

pub async fn assign_teacher(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<AssignTeacherRequest>,
) -> Result<Json<Course>, AppError> {
    actor.require_professor()?;
    check_teacher(&state, &req.teacher_id).await?;
    let course = courses::assign_teacher(&state.db, &id, &req.teacher_id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!("Assigned teacher {} to course {}", req.teacher_id, id);
    Ok(Json(course))
}

pub async fn course_report(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<ClassReport>, AppError> {
    let entry = courses::find_course_with_teacher(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    actor.require_course_owner(&entry.course)?;
    let report = ReportService::new(state.db.clone()).class_report(entry).await?;
    Ok(Json(report))
}

pub async fn all_reports(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<CourseReportSummary>>, AppError> {
    actor.require_professor()?;
    let reports = ReportService::new(state.db.clone()).all_reports().await?;
    Ok(Json(reports))
}

pub async fn bulk_enroll(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<BulkEnrollRequest>,
) -> Result<(StatusCode, Json<Vec<Enrollment>>), AppError> {
    actor.require_staff()?;
    let created = EnrollmentService::new(state.db.clone())
        .enroll_many(&id, &req.student_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
