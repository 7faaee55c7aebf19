use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::reference_point;
use crate::db::libraries;
use crate::error::AppError;
use crate::geo::{BookCatalog, BookFilter, Coordinate, LibraryListing, LibrarySort, build_catalog, distance_km, rank_libraries};
use crate::models::*;
use crate::services::Actor;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LibraryQueryParams {
    #[serde(default)]
    search: String,
    #[serde(default)]
    sort: LibrarySort,
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Deserialize)]
pub struct PointParams {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Serialize)]
pub struct LibraryDetail {
    #[serde(flatten)]
    library: Library,
    books: Vec<Book>,
    distance: Option<f64>,
}

pub async fn list_libraries(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<LibraryQueryParams>,
) -> Result<Json<Vec<LibraryListing>>, AppError> {
    let origin = reference_point(params.lat, params.lng, &actor)?;
    let rows = libraries::fetch_libraries_with_counts(&state.db).await?;
    Ok(Json(rank_libraries(rows, &params.search, origin, params.sort)))
}

pub async fn get_library(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Query(params): Query<PointParams>,
) -> Result<Json<LibraryDetail>, AppError> {
    let origin = reference_point(params.lat, params.lng, &actor)?;
    let library = libraries::find_library(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let books = libraries::fetch_library_books(&state.db, &id).await?;
    let distance = origin.map(|o| distance_km(o, Coordinate::new(library.latitude, library.longitude)));

    Ok(Json(LibraryDetail {
        library,
        books,
        distance,
    }))
}

pub async fn create_library(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<NewLibraryRequest>,
) -> Result<(StatusCode, Json<Library>), AppError> {
    actor.require_professor()?;
    if req.name.trim().is_empty() || req.address.trim().is_empty() {
        return Err(AppError::BadRequest("name and address are required".to_string()));
    }
    if !Coordinate::new(req.latitude, req.longitude).is_valid() {
        return Err(AppError::BadRequest("invalid library coordinate".to_string()));
    }
    let library = libraries::insert_library(&state.db, req).await?;
    info!("Created library {} ({})", library.name, library.id);
    Ok((StatusCode::CREATED, Json(library)))
}

pub async fn create_book(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<NewBookRequest>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    actor.require_professor()?;
    if req.quantity < 0 {
        return Err(AppError::BadRequest("quantity must not be negative".to_string()));
    }
    if req.available.is_some_and(|a| a < 0 || a > req.quantity) {
        return Err(AppError::BadRequest(format!(
            "available must lie within 0..={}",
            req.quantity
        )));
    }
    if libraries::find_library(&state.db, &req.library_id).await?.is_none() {
        return Err(AppError::BadRequest(format!("unknown library {}", req.library_id)));
    }
    let book = libraries::insert_book(&state.db, req).await?;
    info!("Added book {} to library {}", book.title, book.library_id);
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn list_books(
    State(state): State<AppState>,
    _actor: Actor,
    Query(filter): Query<BookFilter>,
) -> Result<Json<BookCatalog>, AppError> {
    let books = libraries::fetch_book_views(&state.db).await?;
    Ok(Json(build_catalog(books, &filter)))
}
