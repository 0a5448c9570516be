use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{NewReview, Review, Success},
    routes::AppState,
};

/// Handler for GET /api/reviews/:movie_id
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.store.list_reviews(&movie_id).await?;
    Ok(Json(reviews))
}

/// Handler for POST /api/reviews
pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<NewReview>, JsonRejection>,
) -> AppResult<Json<Success>> {
    let Json(review) = payload?;

    state.store.add_review(&review).await?;

    tracing::info!(
        request_id = %request_id,
        movie_id = %review.movie_id,
        rating = review.rating,
        "Review stored"
    );

    Ok(Json(Success::ok()))
}
