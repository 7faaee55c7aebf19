use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::db::{courses, events, normalize_timestamp};
use crate::error::AppError;
use crate::models::*;
use crate::services::Actor;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EventQueryParams {
    start: Option<String>,
    end: Option<String>,
}

fn normalize_opt(value: Option<String>) -> Result<Option<String>, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| normalize_timestamp(&v))
        .transpose()
}

async fn check_course(state: &AppState, course_id: Option<&str>) -> Result<(), AppError> {
    let Some(id) = course_id.filter(|c| !c.is_empty()) else {
        return Ok(());
    };
    if courses::find_course(&state.db, id).await?.is_none() {
        return Err(AppError::BadRequest(format!("unknown course {}", id)));
    }
    Ok(())
}

fn check_window(start: &str, end: Option<&str>) -> Result<(), AppError> {
    match end {
        Some(end) if end < start => Err(AppError::BadRequest(
            "end_time must not be before start_time".to_string(),
        )),
        _ => Ok(()),
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    _actor: Actor,
    Query(params): Query<EventQueryParams>,
) -> Result<Json<Vec<EventView>>, AppError> {
    let start = normalize_opt(params.start)?;
    let end = normalize_opt(params.end)?;
    let list = events::fetch_events(&state.db, start.as_deref(), end.as_deref()).await?;
    Ok(Json(list))
}

pub async fn create_event(
    State(state): State<AppState>,
    actor: Actor,
    Json(mut req): Json<NewEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    req.start_time = normalize_timestamp(&req.start_time)?;
    req.end_time = normalize_opt(req.end_time)?;
    check_window(&req.start_time, req.end_time.as_deref())?;
    check_course(&state, req.course_id.as_deref()).await?;

    let event = events::insert_event(&state.db, req, actor.id()).await?;
    info!("Created event {} ({})", event.title, event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let current = events::find_event(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    req.start_time = normalize_opt(req.start_time)?;
    req.end_time = normalize_opt(req.end_time)?;
    check_window(
        req.start_time.as_deref().unwrap_or(&current.start_time),
        req.end_time.as_deref().or(current.end_time.as_deref()),
    )?;
    check_course(&state, req.course_id.as_deref()).await?;

    let event = events::update_event(&state.db, &id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    info!("Updated event {}", id);
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if events::delete_event(&state.db, &id).await? {
        info!("Deleted event {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
