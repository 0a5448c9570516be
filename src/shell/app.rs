use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Movie, NewReview, NewWishlistItem, Review, WishlistItem, WishlistKey},
    services::{CatalogClient, GeminiRecommender, RecommendationProvider, TmdbCatalog},
    shell::{
        client::{HttpLlaneraApi, LlaneraApi},
        state::{LiveChannel, Overlay, SearchResults, ShellState, Tab},
    },
};

/// Drives the viewer's session: loads data, reacts to actions and keeps
/// [`ShellState`] in sync with the service.
pub struct AppShell {
    catalog: Arc<dyn CatalogClient>,
    recommender: Arc<dyn RecommendationProvider>,
    api: Arc<dyn LlaneraApi>,
    user_email: String,
    live: LiveChannel,
    state: ShellState,
}

impl AppShell {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        recommender: Arc<dyn RecommendationProvider>,
        api: Arc<dyn LlaneraApi>,
        user_email: String,
        live: LiveChannel,
    ) -> Self {
        Self {
            catalog,
            recommender,
            api,
            user_email,
            live,
            state: ShellState::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(TmdbCatalog::from_config(config)),
            Arc::new(GeminiRecommender::from_config(config)),
            Arc::new(HttpLlaneraApi::from_config(config)),
            config.user_email.clone(),
            LiveChannel::new(
                config.live_stream_url.clone(),
                config.live_poster_url.clone(),
            ),
        )
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn live_channel(&self) -> &LiveChannel {
        &self.live
    }

    pub fn featured(&self) -> Option<&Movie> {
        self.state.featured()
    }

    pub fn acclaimed(&self) -> impl Iterator<Item = &Movie> {
        self.state.acclaimed()
    }

    pub fn is_in_wishlist(&self, movie_id: u64) -> bool {
        self.state.is_in_wishlist(movie_id)
    }

    /// Loads trending and the wishlist and lands on the home tab
    ///
    /// Recommendations are not awaited here; follow up with
    /// [`AppShell::load_recommendations`] once the home view is up.
    pub async fn start(&mut self) -> AppResult<()> {
        self.state.trending = self.catalog.get_trending().await?;
        self.refresh_wishlist().await?;
        self.state.tab = Tab::Home;

        tracing::info!(
            trending = self.state.trending.len(),
            wishlist = self.state.wishlist.len(),
            "Session loaded"
        );

        Ok(())
    }

    /// Fetches recommendations for the current wishlist
    ///
    /// Failures leave the list empty; an empty wishlist skips the call.
    pub async fn load_recommendations(&mut self) {
        self.state.recommendations = match self.recommendations_request() {
            Some(request) => request.await,
            None => Vec::new(),
        };
    }

    /// Detached recommendation fetch for hosts that keep the shell
    /// responsive while it runs; hand the result to
    /// [`AppShell::apply_recommendations`]
    pub fn recommendations_request(
        &self,
    ) -> Option<impl std::future::Future<Output = Vec<String>> + Send + 'static> {
        if self.state.wishlist.is_empty() {
            return None;
        }

        let liked: Vec<String> = self
            .state
            .wishlist
            .iter()
            .map(|item| item.title.clone())
            .collect();
        let recommender = self.recommender.clone();

        Some(async move {
            match recommender.get_recommendations(liked).await {
                Ok(titles) => {
                    tracing::debug!(recommended = titles.len(), "Recommendations loaded");
                    titles
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Recommendations unavailable");
                    Vec::new()
                }
            }
        })
    }

    pub fn apply_recommendations(&mut self, titles: Vec<String>) {
        self.state.recommendations = titles;
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.state.tab = tab;
    }

    /// Runs a catalog search; blank queries are ignored
    pub async fn search(&mut self, query: &str) -> AppResult<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        let results = self.catalog.search(query).await?;
        self.state.overlay = Overlay::Searching(SearchResults {
            query: query.to_string(),
            results,
        });

        Ok(())
    }

    /// Opens the details overlay for a movie
    ///
    /// Nothing changes when the catalog has no details to offer.
    pub async fn open_movie(&mut self, movie_id: u64) -> AppResult<()> {
        let Some(details) = self.catalog.get_details(movie_id).await? else {
            tracing::debug!(movie_id, "No details available");
            return Ok(());
        };

        let search = self.state.overlay.search().cloned();
        self.state.overlay = Overlay::Details {
            movie: Box::new(details),
            search,
        };

        Ok(())
    }

    pub async fn open_wishlist_item(&mut self, item: &WishlistItem) -> AppResult<()> {
        let movie_id = item.movie_id.parse::<u64>().map_err(|_| {
            AppError::InvalidInput(format!("Not a catalog movie id: {}", item.movie_id))
        })?;
        self.open_movie(movie_id).await
    }

    pub fn close_overlay(&mut self) {
        let overlay = std::mem::take(&mut self.state.overlay);
        self.state.overlay = overlay.close();
    }

    /// Adds the movie to the wishlist, or removes it if already there, then
    /// re-reads the wishlist
    pub async fn toggle_wishlist(&mut self, movie: &Movie) -> AppResult<()> {
        if self.state.is_in_wishlist(movie.id) {
            self.api
                .remove_from_wishlist(WishlistKey {
                    email: self.user_email.clone(),
                    movie_id: movie.id.to_string(),
                })
                .await?;
        } else {
            let added = self
                .api
                .add_to_wishlist(NewWishlistItem {
                    email: self.user_email.clone(),
                    movie_id: movie.id.to_string(),
                    title: movie.title.clone(),
                    poster_path: movie.poster_path.clone(),
                })
                .await;
            match added {
                Ok(()) => {}
                Err(AppError::Conflict(msg)) => {
                    tracing::debug!(movie_id = movie.id, reason = %msg, "Wishlist add ignored");
                }
                Err(e) => return Err(e),
            }
        }

        self.refresh_wishlist().await
    }

    /// Toggles the movie shown in the details overlay
    pub async fn toggle_selected(&mut self) -> AppResult<()> {
        let movie = self
            .state
            .overlay
            .selected()
            .map(|details| details.movie.clone())
            .ok_or_else(|| AppError::InvalidInput("No movie selected".to_string()))?;

        self.toggle_wishlist(&movie).await
    }

    pub async fn reviews(&self, movie_id: u64) -> AppResult<Vec<Review>> {
        self.api.get_reviews(&movie_id.to_string()).await
    }

    /// Posts a 1-5 star review and returns the movie's reviews, newest first
    pub async fn submit_review(
        &self,
        movie_id: u64,
        rating: i64,
        comment: &str,
    ) -> AppResult<Vec<Review>> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between 1 and 5, got {}",
                rating
            )));
        }

        self.api
            .add_review(NewReview {
                email: self.user_email.clone(),
                movie_id: movie_id.to_string(),
                rating,
                comment: comment.trim().to_string(),
            })
            .await?;

        self.reviews(movie_id).await
    }

    async fn refresh_wishlist(&mut self) -> AppResult<()> {
        self.state.wishlist = self.api.get_wishlist(&self.user_email).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieDetails;
    use crate::services::catalog::MockCatalogClient;
    use crate::services::recommendations::MockRecommendationProvider;
    use crate::shell::client::MockLlaneraApi;
    use std::sync::Mutex;

    const EMAIL: &str = "a@b.com";

    fn movie(id: u64, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{}.jpg", id)),
            ..Default::default()
        }
    }

    fn details(id: u64, title: &str) -> MovieDetails {
        MovieDetails {
            movie: movie(id, title),
            ..Default::default()
        }
    }

    fn listed(id: i64, movie_id: &str, title: &str) -> WishlistItem {
        WishlistItem {
            id,
            user_email: EMAIL.to_string(),
            movie_id: movie_id.to_string(),
            title: title.to_string(),
            poster_path: None,
        }
    }

    /// Wishlist API backed by a shared vector
    fn in_memory_api(initial: Vec<WishlistItem>) -> (MockLlaneraApi, Arc<Mutex<Vec<WishlistItem>>>) {
        let rows = Arc::new(Mutex::new(initial));
        let mut api = MockLlaneraApi::new();

        let read = rows.clone();
        api.expect_get_wishlist()
            .returning(move |_| Ok(read.lock().unwrap().clone()));

        let write = rows.clone();
        api.expect_add_to_wishlist().returning(move |item| {
            let mut rows = write.lock().unwrap();
            if rows.iter().any(|row| row.movie_id == item.movie_id) {
                return Err(AppError::Conflict("Already in wishlist".to_string()));
            }
            let id = rows.len() as i64 + 1;
            rows.push(WishlistItem {
                id,
                user_email: item.email,
                movie_id: item.movie_id,
                title: item.title,
                poster_path: item.poster_path,
            });
            Ok(())
        });

        let delete = rows.clone();
        api.expect_remove_from_wishlist().returning(move |key| {
            delete
                .lock()
                .unwrap()
                .retain(|row| row.movie_id != key.movie_id);
            Ok(())
        });

        (api, rows)
    }

    fn shell(
        catalog: MockCatalogClient,
        recommender: MockRecommendationProvider,
        api: MockLlaneraApi,
    ) -> AppShell {
        AppShell::new(
            Arc::new(catalog),
            Arc::new(recommender),
            Arc::new(api),
            EMAIL.to_string(),
            LiveChannel::new("https://live/index.m3u8".into(), "poster".into()),
        )
    }

    #[tokio::test]
    async fn test_start_loads_everything() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_get_trending()
            .times(1)
            .returning(|| Ok(vec![movie(1, "Alien"), movie(2, "Heat")]));

        let mut recommender = MockRecommendationProvider::new();
        recommender
            .expect_get_recommendations()
            .times(1)
            .returning(|liked| {
                assert_eq!(liked, vec!["Brazil".to_string()]);
                Ok(vec!["Twelve Monkeys".to_string()])
            });

        let (api, _) = in_memory_api(vec![listed(1, "3", "Brazil")]);
        let mut shell = shell(catalog, recommender, api);
        shell.set_tab(Tab::Tv);

        shell.start().await.unwrap();
        assert!(shell.state().recommendations.is_empty());
        shell.load_recommendations().await;

        let state = shell.state();
        assert_eq!(state.tab, Tab::Home);
        assert_eq!(state.trending.len(), 2);
        assert_eq!(state.wishlist.len(), 1);
        assert_eq!(state.recommendations, vec!["Twelve Monkeys"]);
        assert_eq!(shell.featured().map(|m| m.id), Some(1));
    }

    #[tokio::test]
    async fn test_start_skips_recommendations_for_empty_wishlist() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_get_trending().returning(|| Ok(Vec::new()));

        // No expectation: any call would panic
        let recommender = MockRecommendationProvider::new();

        let (api, _) = in_memory_api(Vec::new());
        let mut shell = shell(catalog, recommender, api);

        shell.start().await.unwrap();
        assert!(shell.recommendations_request().is_none());
        shell.load_recommendations().await;

        assert!(shell.state().recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_start_survives_recommendation_failure() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_get_trending()
            .returning(|| Ok(vec![movie(1, "Alien")]));

        let mut recommender = MockRecommendationProvider::new();
        recommender
            .expect_get_recommendations()
            .returning(|_| Err(AppError::ExternalApi("upstream down".to_string())));

        let (api, _) = in_memory_api(vec![listed(1, "3", "Brazil")]);
        let mut shell = shell(catalog, recommender, api);

        shell.start().await.unwrap();
        shell.load_recommendations().await;

        assert!(shell.state().recommendations.is_empty());
        assert_eq!(shell.state().trending.len(), 1);
    }

    /// Recommender whose upstream never answers
    struct StalledRecommender;

    #[async_trait::async_trait]
    impl RecommendationProvider for StalledRecommender {
        async fn get_recommendations(&self, _liked: Vec<String>) -> AppResult<Vec<String>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_start_does_not_wait_for_stalled_recommendations() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_get_trending()
            .returning(|| Ok(vec![movie(1, "Alien")]));
        let (api, _) = in_memory_api(vec![listed(1, "3", "Brazil")]);

        let mut shell = AppShell::new(
            Arc::new(catalog),
            Arc::new(StalledRecommender),
            Arc::new(api),
            EMAIL.to_string(),
            LiveChannel::new("https://live/index.m3u8".into(), "poster".into()),
        );
        shell.set_tab(Tab::Wishlist);

        tokio::time::timeout(std::time::Duration::from_secs(2), shell.start())
            .await
            .expect("startup waited on recommendations")
            .unwrap();

        assert_eq!(shell.state().tab, Tab::Home);
        assert_eq!(shell.state().wishlist.len(), 1);

        let request = shell.recommendations_request().unwrap();
        let pending = tokio::spawn(request);
        shell.set_tab(Tab::Movies);
        assert_eq!(shell.state().tab, Tab::Movies);
        assert!(!pending.is_finished());
        pending.abort();
    }

    #[tokio::test]
    async fn test_detached_recommendations_are_applied() {
        let mut recommender = MockRecommendationProvider::new();
        recommender
            .expect_get_recommendations()
            .returning(|_| Ok(vec!["Aliens".to_string()]));
        let (api, _) = in_memory_api(vec![listed(1, "348", "Alien")]);
        let mut catalog = MockCatalogClient::new();
        catalog.expect_get_trending().returning(|| Ok(Vec::new()));
        let mut shell = shell(catalog, recommender, api);

        shell.start().await.unwrap();
        let titles = tokio::spawn(shell.recommendations_request().unwrap())
            .await
            .unwrap();
        shell.apply_recommendations(titles);

        assert_eq!(shell.state().recommendations, vec!["Aliens"]);
    }

    #[tokio::test]
    async fn test_start_fails_when_trending_fails() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_get_trending()
            .returning(|| Err(AppError::ExternalApi("TMDB down".to_string())));

        let mut shell = shell(
            catalog,
            MockRecommendationProvider::new(),
            MockLlaneraApi::new(),
        );

        assert!(shell.start().await.is_err());
    }

    #[tokio::test]
    async fn test_blank_search_is_ignored() {
        let catalog = MockCatalogClient::new();
        let mut shell = shell(
            catalog,
            MockRecommendationProvider::new(),
            MockLlaneraApi::new(),
        );

        shell.search("   ").await.unwrap();

        assert!(shell.state().overlay.is_none());
    }

    #[tokio::test]
    async fn test_search_then_details_then_close() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_search().times(1).returning(|query| {
            assert_eq!(query, "alien");
            Ok(vec![movie(348, "Alien")])
        });
        catalog
            .expect_get_details()
            .times(1)
            .returning(|id| Ok(Some(details(id, "Alien"))));

        let mut shell = shell(
            catalog,
            MockRecommendationProvider::new(),
            MockLlaneraApi::new(),
        );

        shell.search(" alien ").await.unwrap();
        let search = shell.state().overlay.search().cloned().unwrap();
        assert_eq!(search.query, "alien");
        assert_eq!(search.results.len(), 1);

        shell.open_movie(348).await.unwrap();
        assert_eq!(shell.state().overlay.selected().map(|m| m.id()), Some(348));

        shell.close_overlay();
        assert_eq!(shell.state().overlay, Overlay::Searching(search));

        shell.close_overlay();
        assert!(shell.state().overlay.is_none());
    }

    #[tokio::test]
    async fn test_open_movie_without_details_keeps_overlay() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_get_details().returning(|_| Ok(None));

        let mut shell = shell(
            catalog,
            MockRecommendationProvider::new(),
            MockLlaneraApi::new(),
        );

        shell.open_movie(1).await.unwrap();

        assert!(shell.state().overlay.is_none());
    }

    #[tokio::test]
    async fn test_open_wishlist_item_with_bad_id() {
        let mut shell = shell(
            MockCatalogClient::new(),
            MockRecommendationProvider::new(),
            MockLlaneraApi::new(),
        );

        let result = shell.open_wishlist_item(&listed(1, "abc", "Broken")).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let (api, rows) = in_memory_api(Vec::new());
        let mut shell = shell(
            MockCatalogClient::new(),
            MockRecommendationProvider::new(),
            api,
        );
        let heat = movie(949, "Heat");

        shell.toggle_wishlist(&heat).await.unwrap();
        assert!(shell.is_in_wishlist(949));
        assert_eq!(rows.lock().unwrap()[0].title, "Heat");
        assert_eq!(
            rows.lock().unwrap()[0].poster_path.as_deref(),
            Some("/949.jpg")
        );

        shell.toggle_wishlist(&heat).await.unwrap();
        assert!(!shell.is_in_wishlist(949));
        assert!(rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_conflict_still_refreshes() {
        // Listed on the server but not yet in the local copy
        let (api, _) = in_memory_api(vec![listed(1, "949", "Heat")]);
        let mut shell = shell(
            MockCatalogClient::new(),
            MockRecommendationProvider::new(),
            api,
        );

        shell.toggle_wishlist(&movie(949, "Heat")).await.unwrap();

        assert!(shell.is_in_wishlist(949));
        assert_eq!(shell.state().wishlist.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_selected_requires_details() {
        let mut shell = shell(
            MockCatalogClient::new(),
            MockRecommendationProvider::new(),
            MockLlaneraApi::new(),
        );

        assert!(matches!(
            shell.toggle_selected().await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_selected_movie() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_get_details()
            .returning(|id| Ok(Some(details(id, "Alien"))));
        let (api, _) = in_memory_api(Vec::new());
        let mut shell = shell(catalog, MockRecommendationProvider::new(), api);

        shell.open_movie(348).await.unwrap();
        shell.toggle_selected().await.unwrap();

        assert!(shell.is_in_wishlist(348));
    }

    #[tokio::test]
    async fn test_submit_review_rejects_out_of_range_rating() {
        let shell = shell(
            MockCatalogClient::new(),
            MockRecommendationProvider::new(),
            MockLlaneraApi::new(),
        );

        assert!(matches!(
            shell.submit_review(1, 6, "too good").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            shell.submit_review(1, 0, "too bad").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_review_returns_refreshed_list() {
        let mut api = MockLlaneraApi::new();
        api.expect_add_review().times(1).returning(|review| {
            assert_eq!(review.email, EMAIL);
            assert_eq!(review.movie_id, "603");
            assert_eq!(review.comment, "Loved it");
            Ok(())
        });
        api.expect_get_reviews().times(1).returning(|movie_id| {
            Ok(vec![Review {
                id: 1,
                user_email: EMAIL.to_string(),
                movie_id: movie_id.to_string(),
                rating: 5,
                comment: "Loved it".to_string(),
                created_at: chrono::Utc::now(),
            }])
        });

        let shell = shell(
            MockCatalogClient::new(),
            MockRecommendationProvider::new(),
            api,
        );

        let reviews = shell.submit_review(603, 5, " Loved it ").await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].movie_id, "603");
    }

    #[test]
    fn test_live_channel_from_config() {
        let config = Config::from_vars(vec![(
            "LIVE_STREAM_URL".to_string(),
            "https://example/live.m3u8".to_string(),
        )])
        .unwrap();

        let shell = AppShell::from_config(&config);

        assert_eq!(shell.live_channel().stream_url, "https://example/live.m3u8");
        assert_eq!(shell.user_email(), "viewer@llanera.tv");
    }
}
