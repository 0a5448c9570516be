use llanera_tv::{
    config::Config,
    db::{self, Store},
    routes::{self, assets::AssetMode, AppState},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("llanera_tv=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    let state = AppState::new(Store::new(pool));

    let app = routes::create_app(state, &AssetMode::from_config(&config));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, serve_mode = ?config.serve_mode, "Server running");

    axum::serve(listener, app).await?;

    Ok(())
}
