use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/movies/", get(handlers::list_movies))
        .route("/movies/random/", get(handlers::random_movie))
        .route("/movies/:slug/", get(handlers::get_movie))
        .route("/genres/", get(handlers::list_genres))
        // Watchlist
        .route("/list/", get(handlers::list_items).post(handlers::add_item))
        .route(
            "/list/:uid/",
            get(handlers::get_item).delete(handlers::delete_item),
        )
        // Ingestion
        .route("/ingest", post(handlers::start_ingest))
}
