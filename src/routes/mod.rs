use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::Store,
    error::AppError,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
};
use assets::AssetMode;

pub mod assets;
pub mod reviews;
pub mod wishlist;

/// Shared application state
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

/// Creates the application router with all API routes and nothing else
pub fn create_router(state: Arc<AppState>) -> Router {
    create_app(state, &AssetMode::ApiOnly)
}

/// Creates the full application: API routes plus the non-API fallback for
/// the given mode, all behind the same middleware stack
pub fn create_app(state: Arc<AppState>, mode: &AssetMode) -> Router {
    let router = Router::new().nest("/api", api_routes()).with_state(state);

    assets::attach(router, mode).layer(
        ServiceBuilder::new()
            .layer(CorsLayer::permissive())
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
    )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/wishlist",
            get(wishlist::list)
                .post(wishlist::add)
                .delete(wishlist::remove),
        )
        .route("/reviews", post(reviews::add))
        .route("/reviews/:movie_id", get(reviews::list))
        .fallback(api_not_found)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Unknown paths under /api never reach the asset fallback
async fn api_not_found() -> AppError {
    AppError::NotFound("No such API route".to_string())
}
