use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{AddItemRequest, FilterCriteria, GenreCount, ItemView, MovieQuery, Page, RatedMovie},
};

use super::{
    auth::{AuthUser, Viewer},
    AppState,
};

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestAccepted {
    pub job_id: Uuid,
    pub url: String,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Filtered catalog, best rated first
pub async fn list_movies(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<RatedMovie>>> {
    let criteria = FilterCriteria::try_from(MovieQuery::from_iter(pairs))?;
    let movies = state.catalog.list(&criteria, viewer).await?;
    Ok(Json(Page::from(movies)))
}

pub async fn random_movie(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> AppResult<Json<RatedMovie>> {
    Ok(Json(state.catalog.pick_random(viewer).await?))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(slug): Path<String>,
) -> AppResult<Json<RatedMovie>> {
    Ok(Json(state.catalog.get(&slug, viewer).await?))
}

/// Genres, most used first
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<GenreCount>>> {
    Ok(Json(state.catalog.genres_by_popularity().await?))
}

pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> AppResult<Json<Page<ItemView>>> {
    let items = state.watchlist.items(owner).await?;
    Ok(Json(Page::from(items)))
}

pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(request): Json<AddItemRequest>,
) -> AppResult<(StatusCode, Json<ItemView>)> {
    let item = state
        .watchlist
        .add_by_slug(owner, request.movie_slug.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(uid): Path<Uuid>,
) -> AppResult<Json<ItemView>> {
    Ok(Json(state.watchlist.get_item(owner, uid).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(uid): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.watchlist.delete_item(owner, uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Starts a background ingestion batch for every title on a listing page
pub async fn start_ingest(
    State(state): State<AppState>,
    AuthUser(requested_by): AuthUser,
    Json(request): Json<IngestRequest>,
) -> AppResult<(StatusCode, Json<IngestAccepted>)> {
    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .ok_or_else(|| AppError::validation("url", "expected an http(s) URL"))?;

    let job_id = state.ingest.spawn_from_url(url.clone());
    tracing::info!(job_id = %job_id, requested_by = %requested_by, url = %url, "Ingestion requested");

    Ok((StatusCode::ACCEPTED, Json(IngestAccepted { job_id, url })))
}
