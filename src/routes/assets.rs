use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header,
    response::Response,
    routing::any,
    Router,
};
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};

use crate::{
    config::{Config, ServeMode},
    error::{AppError, AppResult},
};

/// Largest request body relayed to the dev server
const MAX_PROXY_BODY: usize = 2 * 1024 * 1024;

/// Where non-API requests go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetMode {
    /// Forward to a running front-end dev server
    DevProxy { dev_server_url: String },
    /// Serve files from a built bundle; unknown paths get `index.html`
    Static { dir: PathBuf },
    /// Leave non-API paths unanswered
    ApiOnly,
}

impl AssetMode {
    pub fn from_config(config: &Config) -> Self {
        match config.serve_mode {
            ServeMode::Development => AssetMode::DevProxy {
                dev_server_url: config.dev_server_url.clone(),
            },
            ServeMode::Production => AssetMode::Static {
                dir: PathBuf::from(&config.static_dir),
            },
            ServeMode::ApiOnly => AssetMode::ApiOnly,
        }
    }
}

#[derive(Clone)]
struct DevProxy {
    http_client: reqwest::Client,
    base_url: String,
}

/// Installs the non-API fallback for the given mode
pub fn attach(router: Router, mode: &AssetMode) -> Router {
    match mode {
        AssetMode::DevProxy { dev_server_url } => {
            tracing::info!(dev_server_url = %dev_server_url, "Proxying assets to dev server");
            let proxy = DevProxy {
                http_client: reqwest::Client::new(),
                base_url: dev_server_url.trim_end_matches('/').to_string(),
            };
            router.fallback_service(any(proxy_to_dev_server).with_state::<()>(proxy))
        }
        AssetMode::Static { dir } => {
            tracing::info!(static_dir = %dir.display(), "Serving static assets");
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        AssetMode::ApiOnly => router,
    }
}

async fn proxy_to_dev_server(
    State(proxy): State<DevProxy>,
    request: Request,
) -> AppResult<Response> {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", proxy.base_url, path_and_query);

    let method = request.method().clone();
    let accept = request.headers().get(header::ACCEPT).cloned();
    let content_type = request.headers().get(header::CONTENT_TYPE).cloned();
    let body = to_bytes(request.into_body(), MAX_PROXY_BODY)
        .await
        .map_err(|e| AppError::InvalidInput(format!("Unreadable request body: {}", e)))?;

    let mut upstream = proxy.http_client.request(method, &url).body(body);
    if let Some(accept) = accept {
        upstream = upstream.header(header::ACCEPT, accept);
    }
    if let Some(content_type) = content_type {
        upstream = upstream.header(header::CONTENT_TYPE, content_type);
    }

    let upstream = upstream.send().await?;

    let mut response = Response::builder().status(upstream.status());
    for name in [
        header::CONTENT_TYPE,
        header::CACHE_CONTROL,
        header::ETAG,
        header::LOCATION,
    ] {
        if let Some(value) = upstream.headers().get(&name) {
            response = response.header(name, value.clone());
        }
    }

    let bytes = upstream.bytes().await?;

    response
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        Config::from_vars(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_development_mode_proxies() {
        let mode = AssetMode::from_config(&config(&[("DEV_SERVER_URL", "http://localhost:5173")]));
        assert_eq!(
            mode,
            AssetMode::DevProxy {
                dev_server_url: "http://localhost:5173".to_string()
            }
        );
    }

    #[test]
    fn test_production_mode_serves_static_dir() {
        let mode = AssetMode::from_config(&config(&[
            ("SERVE_MODE", "production"),
            ("STATIC_DIR", "public"),
        ]));
        assert_eq!(
            mode,
            AssetMode::Static {
                dir: PathBuf::from("public")
            }
        );
    }

    #[test]
    fn test_api_only_mode() {
        let mode = AssetMode::from_config(&config(&[("SERVE_MODE", "api_only")]));
        assert_eq!(mode, AssetMode::ApiOnly);
    }
}
