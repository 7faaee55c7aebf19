pub mod analytics;
pub mod courses;
pub mod enrollments;
pub mod events;
pub mod grades;
pub mod identity;
pub mod libraries;
pub mod profiles;

use axum::routing::{delete, patch, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::geo::Coordinate;
use crate::services::Actor;
use crate::state::AppState;

pub use identity::USER_ID_HEADER;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/profiles", post(profiles::create_profile))
        .route("/profiles/{id}", get(profiles::get_profile).patch(profiles::update_profile))
        .route("/profiles/{id}/role", patch(profiles::update_role))
        .route("/me", get(profiles::me))
        .route("/me/navigation", get(profiles::navigation))
        .route("/students", get(profiles::list_students))
        .route("/students/{id}/enrollments", get(profiles::student_enrollments))
        .route("/students/{id}/grade-stats", get(profiles::student_grade_stats))
        .route("/students/{id}/events", get(profiles::student_events))
        .route("/student-locations", get(profiles::student_locations))
        .route("/teachers", get(profiles::list_teachers))
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/{id}/teacher", put(courses::assign_teacher))
        .route("/courses/{id}/report", get(courses::course_report))
        .route("/courses/{id}/enrollments", post(courses::bulk_enroll))
        .route("/reports", get(courses::all_reports))
        .route(
            "/enrollments",
            get(enrollments::list_enrollments).post(enrollments::create_enrollment),
        )
        .route("/enrollments/{id}", delete(enrollments::delete_enrollment))
        .route("/grades", get(grades::list_grades).post(grades::create_grade))
        .route("/grades/bulk", post(grades::bulk_create_grades))
        .route("/grades/{id}", patch(grades::update_grade).delete(grades::delete_grade))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/{id}", patch(events::update_event).delete(events::delete_event))
        .route("/analytics/summary", get(analytics::summary))
        .route("/analytics/grade-distribution", get(analytics::grade_distribution))
        .route("/analytics/top-students", get(analytics::top_students))
        .route("/analytics/course-performance", get(analytics::course_performance))
        .route("/analytics/teacher-performance", get(analytics::teacher_performance))
        .route("/analytics/enrollment-trends", get(analytics::enrollment_trends))
        .route("/analytics/recent-activity", get(analytics::recent_activity))
        .route("/libraries", get(libraries::list_libraries).post(libraries::create_library))
        .route("/libraries/{id}", get(libraries::get_library))
        .route("/books", get(libraries::list_books).post(libraries::create_book))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

/// The point distances are measured from: explicit `lat`/`lng` when both are
/// given, otherwise the caller's home.
pub(crate) fn reference_point(
    lat: Option<f64>,
    lng: Option<f64>,
    actor: &Actor,
) -> Result<Option<Coordinate>, AppError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let point = Coordinate::new(lat, lng);
            if point.is_valid() {
                Ok(Some(point))
            } else {
                Err(AppError::BadRequest(format!("invalid coordinate {}, {}", lat, lng)))
            }
        }
        (None, None) => Ok(Coordinate::from_profile(&actor.profile)),
        _ => Err(AppError::BadRequest("lat and lng must be given together".to_string())),
    }
}
