use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::reference_point;
use crate::db::{enrollments, events, profiles};
use crate::error::AppError;
use crate::geo::{StudentLocation, locate_students};
use crate::models::*;
use crate::services::{Actor, NavEntry, ProfileService, ReportService, entries_for};
use crate::state::AppState;
use crate::stats::StudentGradeStats;

const UPCOMING_EVENTS: i64 = 10;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    search: String,
}

#[derive(Deserialize)]
pub struct LocationParams {
    #[serde(default)]
    search: String,
    lat: Option<f64>,
    lng: Option<f64>,
}

fn profile_service(state: &AppState) -> ProfileService {
    ProfileService::new(state.db.clone(), state.geocoder.clone())
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(req): Json<NewProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let profile = profile_service(&state).register(req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn me(actor: Actor) -> Json<Profile> {
    Json(actor.profile)
}

pub async fn navigation(actor: Actor) -> Json<Vec<NavEntry>> {
    Json(entries_for(actor.role()))
}

pub async fn get_profile(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = profiles::find_profile(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    actor.require_self_or_professor(&id)?;
    let profile = profile_service(&state).update(&id, req).await?;
    Ok(Json(profile))
}

pub async fn update_role(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<Profile>, AppError> {
    actor.require_professor()?;
    let profile = profile_service(&state).change_role(&id, req.new_role).await?;
    Ok(Json(profile))
}

pub async fn list_students(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Profile>>, AppError> {
    actor.require_staff()?;
    let students = profiles::fetch_students(&state.db, Some(&params.search)).await?;
    Ok(Json(students))
}

pub async fn list_teachers(
    State(state): State<AppState>,
    _actor: Actor,
) -> Result<Json<Vec<ProfileSummary>>, AppError> {
    let staff = profiles::fetch_staff(&state.db).await?;
    Ok(Json(staff.iter().map(Profile::summary).collect()))
}

pub async fn student_enrollments(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    actor.require_self_or_staff(&id)?;
    let views = enrollments::fetch_student_enrollments(&state.db, &id).await?;
    Ok(Json(views))
}

pub async fn student_grade_stats(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<StudentGradeStats>, AppError> {
    actor.require_self_or_staff(&id)?;
    let stats = ReportService::new(state.db.clone()).student_stats(&id).await?;
    Ok(Json(stats))
}

pub async fn student_events(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventView>>, AppError> {
    actor.require_self_or_staff(&id)?;
    let upcoming = events::fetch_upcoming_for_student(&state.db, &id, UPCOMING_EVENTS).await?;
    Ok(Json(upcoming))
}

pub async fn student_locations(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<LocationParams>,
) -> Result<Json<Vec<StudentLocation>>, AppError> {
    actor.require_staff()?;
    let origin = reference_point(params.lat, params.lng, &actor)?;
    let students = profiles::fetch_students_with_home(&state.db, actor.teacher_scope()).await?;
    Ok(Json(locate_students(students, &params.search, origin)))
}
