use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{NewReview, NewWishlistItem, Review, User, WishlistItem, WishlistKey},
};

/// Message reported when a wishlist entry already exists
pub const DUPLICATE_WISHLIST_MESSAGE: &str = "Already in wishlist";

/// Durable storage for users, wishlist entries and reviews
///
/// Owns every persisted row; handlers only ever see copies. Cloning is cheap,
/// clones share the same pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Adds a movie to a user's wishlist
    ///
    /// The user row is created on first reference. A second add of the same
    /// (email, movie_id) pair fails with [`AppError::Conflict`] and leaves the
    /// existing row untouched.
    pub async fn add_wishlist_item(&self, item: &NewWishlistItem) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        ensure_user(&mut tx, &item.email).await?;

        sqlx::query(
            "INSERT INTO wishlist (user_email, movie_id, title, poster_path) VALUES (?, ?, ?, ?)",
        )
        .bind(&item.email)
        .bind(&item.movie_id)
        .bind(&item.title)
        .bind(&item.poster_path)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(DUPLICATE_WISHLIST_MESSAGE.to_string())
            }
            other => AppError::Database(other),
        })?;

        tx.commit().await?;

        tracing::debug!(
            email = %item.email,
            movie_id = %item.movie_id,
            "Wishlist item stored"
        );

        Ok(())
    }

    /// Removes a movie from a user's wishlist, returning how many rows went away
    ///
    /// Removing something that is not there is not an error.
    pub async fn remove_wishlist_item(&self, key: &WishlistKey) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM wishlist WHERE user_email = ? AND movie_id = ?")
            .bind(&key.email)
            .bind(&key.movie_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// All wishlist entries for a user, in insertion order
    pub async fn list_wishlist(&self, email: &str) -> AppResult<Vec<WishlistItem>> {
        let items = sqlx::query_as::<_, WishlistItem>(
            "SELECT id, user_email, movie_id, title, poster_path FROM wishlist WHERE user_email = ? ORDER BY id",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Stores a review; the timestamp is assigned by the database
    pub async fn add_review(&self, review: &NewReview) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        ensure_user(&mut tx, &review.email).await?;

        sqlx::query("INSERT INTO reviews (user_email, movie_id, rating, comment) VALUES (?, ?, ?, ?)")
            .bind(&review.email)
            .bind(&review.movie_id)
            .bind(review.rating)
            .bind(&review.comment)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Reviews of a movie, newest first
    pub async fn list_reviews(&self, movie_id: &str) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, user_email, movie_id, rating, comment, created_at
            FROM reviews
            WHERE movie_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    pub async fn get_user(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, subscription_status FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

async fn ensure_user(conn: &mut sqlx::SqliteConnection, email: &str) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO users (email) VALUES (?)")
        .bind(email)
        .execute(conn)
        .await?;
    Ok(())
}
