use axum::{routing::get, Router};
use starlight::{config::Config, routes, services, state::AppState};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_addr;
    let static_dir = config.static_dir.clone();
    tracing::info!(
        tickers = ?config.tickers,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        rsi_window = config.rsi_window,
        "Loaded configuration"
    );

    let state = AppState::new(config)?;

    // Spawn cache eviction task
    let sweeper_state = state.clone();
    tokio::spawn(async move {
        services::market_service::start_cache_sweeper(sweeper_state).await;
    });

    let api_routes = Router::new()
        .route("/tickers", get(routes::tickers::get_tickers))
        .route("/price", get(routes::price::get_price))
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/indicators", get(routes::indicators::get_indicators));

    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
