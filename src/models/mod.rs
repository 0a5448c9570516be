use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod movie;

pub use movie::{
    CastMember, Credits, CrewMember, Genre, Movie, MovieDetails, Paged, Video, Videos,
};

/// Subscription tier assigned to users created on first reference
pub const DEFAULT_SUBSCRIPTION_STATUS: &str = "free";

/// A user known to the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub subscription_status: String,
}

/// A movie saved for later, with the title and poster captured when it was added
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WishlistItem {
    pub id: i64,
    pub user_email: String,
    pub movie_id: String,
    pub title: String,
    pub poster_path: Option<String>,
}

/// A user's rating and comment on a movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub user_email: String,
    pub movie_id: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/wishlist`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWishlistItem {
    pub email: String,
    #[serde(deserialize_with = "movie_id_from_json")]
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Body of `DELETE /api/wishlist`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistKey {
    pub email: String,
    #[serde(deserialize_with = "movie_id_from_json")]
    pub movie_id: String,
}

/// Body of `POST /api/reviews`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewReview {
    pub email: String,
    #[serde(deserialize_with = "movie_id_from_json")]
    pub movie_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

/// Acknowledgement returned by mutating endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Catalog ids arrive as numbers from the catalog but are stored as text
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMovieId {
    Number(u64),
    Text(String),
}

fn movie_id_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawMovieId::deserialize(deserializer)? {
        RawMovieId::Number(id) => id.to_string(),
        RawMovieId::Text(id) => id,
    })
}
