use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::Deserialize;

use crate::{
    config::Config,
    db::store::DUPLICATE_WISHLIST_MESSAGE,
    error::{AppError, AppResult},
    models::{NewReview, NewWishlistItem, Review, WishlistItem, WishlistKey},
};

/// Calls the wishlist/review HTTP service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlaneraApi: Send + Sync {
    async fn get_wishlist(&self, email: &str) -> AppResult<Vec<WishlistItem>>;

    /// Fails with [`AppError::Conflict`] when the movie is already listed
    async fn add_to_wishlist(&self, item: NewWishlistItem) -> AppResult<()>;

    async fn remove_from_wishlist(&self, key: WishlistKey) -> AppResult<()>;

    async fn get_reviews(&self, movie_id: &str) -> AppResult<Vec<Review>>;

    async fn add_review(&self, review: NewReview) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct HttpLlaneraApi {
    http_client: HttpClient,
    base_url: String,
}

impl HttpLlaneraApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url.clone())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

/// Passes successful responses through and turns the service's
/// `{"error": ...}` bodies into errors
async fn check(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(match status {
        StatusCode::BAD_REQUEST if message == DUPLICATE_WISHLIST_MESSAGE => {
            AppError::Conflict(message)
        }
        StatusCode::BAD_REQUEST => AppError::InvalidInput(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        _ => AppError::ExternalApi(format!("Service returned status {}: {}", status, message)),
    })
}

#[async_trait::async_trait]
impl LlaneraApi for HttpLlaneraApi {
    async fn get_wishlist(&self, email: &str) -> AppResult<Vec<WishlistItem>> {
        let response = self
            .http_client
            .get(self.endpoint("/wishlist"))
            .query(&[("email", email)])
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn add_to_wishlist(&self, item: NewWishlistItem) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.endpoint("/wishlist"))
            .json(&item)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn remove_from_wishlist(&self, key: WishlistKey) -> AppResult<()> {
        let response = self
            .http_client
            .delete(self.endpoint("/wishlist"))
            .json(&key)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn get_reviews(&self, movie_id: &str) -> AppResult<Vec<Review>> {
        let response = self
            .http_client
            .get(self.endpoint(&format!("/reviews/{}", movie_id)))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn add_review(&self, review: NewReview) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.endpoint("/reviews"))
            .json(&review)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let api = HttpLlaneraApi::new("http://localhost:3000/");
        assert_eq!(api.endpoint("/wishlist"), "http://localhost:3000/api/wishlist");
    }

    fn response(status: u16, body: &'static str) -> Response {
        Response::from(
            axum::http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let result = check(response(400, r#"{"error":"Already in wishlist"}"#)).await;
        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg == "Already in wishlist"));
    }

    #[tokio::test]
    async fn test_rejected_body_is_invalid_input() {
        let result = check(response(400, r#"{"error":"missing field `title`"}"#)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(msg)) if msg.contains("title")));
    }

    #[tokio::test]
    async fn test_server_failure_is_external() {
        let result = check(response(500, "boom")).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        assert!(check(response(200, "[]")).await.is_ok());
    }
}
