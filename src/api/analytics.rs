use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::Actor;
use crate::services::analytics_service::{
    AnalyticsService, DEFAULT_ACTIVITY_LIMIT, DEFAULT_TOP_STUDENTS, DEFAULT_TREND_MONTHS,
};
use crate::state::AppState;
use crate::stats::analytics::{
    Activity, CoursePerformance, DistributionBucket, MonthlyCount, StudentPerformance,
    SystemSummary, TeacherPerformance,
};

#[derive(Deserialize)]
pub struct LimitParams {
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct TrendParams {
    months: Option<u32>,
}

fn professor_service(state: &AppState, actor: &Actor) -> Result<AnalyticsService, AppError> {
    actor.require_professor()?;
    Ok(AnalyticsService::new(state.db.clone()))
}

pub async fn summary(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<SystemSummary>, AppError> {
    let service = professor_service(&state, &actor)?;
    Ok(Json(service.summary().await?))
}

pub async fn grade_distribution(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<DistributionBucket>>, AppError> {
    let service = professor_service(&state, &actor)?;
    Ok(Json(service.grade_distribution().await?))
}

pub async fn top_students(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<StudentPerformance>>, AppError> {
    let service = professor_service(&state, &actor)?;
    let limit = params.limit.unwrap_or(DEFAULT_TOP_STUDENTS);
    Ok(Json(service.top_students(limit).await?))
}

pub async fn course_performance(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<CoursePerformance>>, AppError> {
    let service = professor_service(&state, &actor)?;
    Ok(Json(service.course_performance().await?))
}

pub async fn teacher_performance(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<TeacherPerformance>>, AppError> {
    let service = professor_service(&state, &actor)?;
    Ok(Json(service.teacher_performance().await?))
}

pub async fn enrollment_trends(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<TrendParams>,
) -> Result<Json<Vec<MonthlyCount>>, AppError> {
    let service = professor_service(&state, &actor)?;
    let months = params.months.unwrap_or(DEFAULT_TREND_MONTHS);
    Ok(Json(service.enrollment_trends(months).await?))
}

pub async fn recent_activity(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Activity>>, AppError> {
    let service = professor_service(&state, &actor)?;
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    Ok(Json(service.recent_activity(limit).await?))
}
