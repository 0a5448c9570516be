use serde::Deserialize;

/// How requests outside `/api` are answered
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServeMode {
    /// Proxy to the front-end dev server
    Development,
    /// Serve the pre-built bundle with a single-page fallback
    Production,
    /// API routes only
    ApiOnly,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Resolved from `SERVE_MODE`, else `NODE_ENV=production`, else development
    #[serde(skip, default = "default_serve_mode")]
    pub serve_mode: ServeMode,

    #[serde(default, rename = "serve_mode")]
    requested_serve_mode: Option<ServeMode>,

    #[serde(default)]
    node_env: Option<String>,

    /// Front-end dev server that non-API requests are forwarded to
    #[serde(default = "default_dev_server_url")]
    pub dev_server_url: String,

    /// Directory holding the production bundle
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// TMDB API key. Without it the catalog answers with empty results.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Name the front-end bundle uses for the same key
    #[serde(default)]
    vite_tmdb_api_key: Option<String>,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Generative Language API key. Without it recommendations are empty.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Base URL of the wishlist/review service, as seen by the shell
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Identity the shell acts as
    #[serde(default = "default_user_email")]
    pub user_email: String,

    /// HLS playlist of the live channel
    #[serde(default = "default_live_stream_url")]
    pub live_stream_url: String,

    #[serde(default = "default_live_poster_url")]
    pub live_poster_url: String,
}

fn default_database_url() -> String {
    "sqlite://llanera.db".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_serve_mode() -> ServeMode {
    ServeMode::Development
}

fn default_dev_server_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_static_dir() -> String {
    "dist".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_user_email() -> String {
    "viewer@llanera.tv".to_string()
}

fn default_live_stream_url() -> String {
    "https://tvspectro.moxapps.shop/live/22OeaFNKyCOwDoFdVOOAwrPDJkx1/index.m3u8".to_string()
}

fn default_live_poster_url() -> String {
    "https://picsum.photos/seed/llanera/1280/720".to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from explicit key/value pairs, using the same
    /// naming rules as the environment
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        Ok(config.normalized())
    }

    /// Blank credentials count as absent; derived settings are resolved
    fn normalized(mut self) -> Self {
        self.tmdb_api_key = non_blank(self.tmdb_api_key.take())
            .or_else(|| non_blank(self.vite_tmdb_api_key.take()));
        self.gemini_api_key = non_blank(self.gemini_api_key.take());

        self.serve_mode = match (self.requested_serve_mode, self.node_env.as_deref()) {
            (Some(mode), _) => mode,
            (None, Some(env)) if env.trim().eq_ignore_ascii_case("production") => {
                ServeMode::Production
            }
            (None, _) => ServeMode::Development,
        };

        self
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
