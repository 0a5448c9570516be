use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{NewWishlistItem, Success, WishlistItem, WishlistKey},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct WishlistQuery {
    email: Option<String>,
}

/// Handler for GET /api/wishlist?email=
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WishlistQuery>,
) -> AppResult<Json<Vec<WishlistItem>>> {
    let Some(email) = params.email else {
        return Ok(Json(Vec::new()));
    };

    let items = state.store.list_wishlist(&email).await?;
    Ok(Json(items))
}

/// Handler for POST /api/wishlist
pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<NewWishlistItem>, JsonRejection>,
) -> AppResult<Json<Success>> {
    let Json(item) = payload?;

    if let Err(e) = state.store.add_wishlist_item(&item).await {
        tracing::info!(
            request_id = %request_id,
            movie_id = %item.movie_id,
            error = %e,
            "Wishlist add rejected"
        );
        return Err(e);
    }

    tracing::info!(
        request_id = %request_id,
        movie_id = %item.movie_id,
        "Added to wishlist"
    );

    Ok(Json(Success::ok()))
}

/// Handler for DELETE /api/wishlist
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<WishlistKey>, JsonRejection>,
) -> AppResult<Json<Success>> {
    let Json(key) = payload?;

    let removed = state.store.remove_wishlist_item(&key).await?;

    tracing::info!(
        request_id = %request_id,
        movie_id = %key.movie_id,
        removed,
        "Removed from wishlist"
    );

    Ok(Json(Success::ok()))
}
