//! Web server adapter.
//!
//! Axum JSON API over the same pipeline the CLI uses, plus static file
//! serving for a front end.

mod error;
mod handlers;

pub use error::{status_from_error, WebError};
pub use handlers::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;

use crate::domain::quote_cache::QuoteCache;
use crate::domain::recommendation::EngineParams;
use crate::domain::valuation::DEFAULT_QUOTE_ASSET;
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_STATIC_DIR: &str = "static";

pub struct AppState {
    pub candles: Arc<dyn CandlePort + Send + Sync>,
    pub prices: Arc<dyn PricePort + Send + Sync>,
    pub quotes: Arc<QuoteCache>,
    pub params: EngineParams,
    pub quote_asset: String,
    pub fetch_timeout: Duration,
}

impl AppState {
    pub fn new(
        candles: Arc<dyn CandlePort + Send + Sync>,
        prices: Arc<dyn PricePort + Send + Sync>,
        quotes: Arc<QuoteCache>,
    ) -> Self {
        Self {
            candles,
            prices,
            quotes,
            params: EngineParams::default(),
            quote_asset: DEFAULT_QUOTE_ASSET.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Apply `[indicators]`, `[market]` and `[web]` settings.
    pub fn configured(mut self, config: &dyn ConfigPort) -> Self {
        self.params = EngineParams::from_config(config);
        if let Some(asset) = config.get_string("market", "quote_asset") {
            self.quote_asset = asset;
        }
        let secs = config.get_double("web", "fetch_timeout_secs", DEFAULT_FETCH_TIMEOUT.as_secs_f64());
        if secs > 0.0 && secs.is_finite() {
            self.fetch_timeout = Duration::from_secs_f64(secs);
        }
        self
    }
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/klines", get(handlers::klines))
        .route("/api/recommendations", get(handlers::recommendations))
        .route(
            "/api/advanced_recommendations",
            get(handlers::advanced_recommendations),
        )
        .route("/api/market/ohlcv", get(handlers::market_ohlcv))
        .route("/api/portfolio/valued", post(handlers::portfolio_valued))
}

pub fn build_router(state: AppState, static_dir: &str) -> Router {
    api_routes()
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

/// Router without static file serving.
pub fn build_api_router(state: AppState) -> Router {
    api_routes()
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

/// Bind `listen` and serve until the process is stopped. Static files are
/// served only when `static_dir` is given.
pub async fn serve(state: AppState, listen: &str, static_dir: Option<&str>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(addr = %listener.local_addr()?, static_dir, "serving");
    let router = match static_dir {
        Some(dir) => build_router(state, dir),
        None => build_api_router(state),
    };
    axum::serve(listener, router).await
}
