pub mod catalog;
pub mod recommendations;

pub use catalog::{image_url, CatalogClient, TmdbCatalog};
pub use recommendations::{GeminiRecommender, RecommendationProvider};
