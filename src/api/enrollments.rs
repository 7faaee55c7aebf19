use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::db::enrollments;
use crate::error::AppError;
use crate::models::*;
use crate::services::{Actor, EnrollmentService};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EnrollmentQueryParams {
    course_id: Option<String>,
}

pub async fn list_enrollments(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<EnrollmentQueryParams>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    actor.require_staff()?;
    let views = enrollments::fetch_enrollments(&state.db, params.course_id.as_deref()).await?;
    Ok(Json(views))
}

pub async fn create_enrollment(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<NewEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    actor.require_staff()?;
    let enrollment = EnrollmentService::new(state.db.clone())
        .enroll(&req.course_id, &req.student_id)
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn delete_enrollment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    actor.require_staff()?;
    EnrollmentService::new(state.db.clone()).unenroll(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
