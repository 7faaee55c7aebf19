use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::db::grades;
use crate::error::AppError;
use crate::models::*;
use crate::services::{Actor, GradeService};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GradeQueryParams {
    student_id: Option<String>,
    course_id: Option<String>,
}

/// Students are always narrowed to their own grades.
pub async fn list_grades(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<GradeQueryParams>,
) -> Result<Json<Vec<GradeView>>, AppError> {
    let student_id = match params.student_id {
        Some(id) => {
            actor.require_self_or_staff(&id)?;
            Some(id)
        }
        None if actor.role().is_staff() => None,
        None => Some(actor.id().to_string()),
    };
    let views = grades::fetch_grades(&state.db, student_id.as_deref(), params.course_id.as_deref()).await?;
    Ok(Json(views))
}

pub async fn create_grade(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<NewGradeRequest>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    actor.require_staff()?;
    let grade = GradeService::new(state.db.clone()).record(req, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

pub async fn bulk_create_grades(
    State(state): State<AppState>,
    actor: Actor,
    Json(reqs): Json<Vec<NewGradeRequest>>,
) -> Result<(StatusCode, Json<Vec<Grade>>), AppError> {
    actor.require_staff()?;
    let created = GradeService::new(state.db.clone())
        .record_bulk(reqs, actor.id())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_grade(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<UpdateGradeRequest>,
) -> Result<Json<Grade>, AppError> {
    actor.require_staff()?;
    let grade = GradeService::new(state.db.clone()).revise(&id, req).await?;
    Ok(Json(grade))
}

pub async fn delete_grade(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    actor.require_staff()?;
    GradeService::new(state.db.clone()).remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
