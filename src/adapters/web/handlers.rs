//! HTTP request handlers for the JSON API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::candle::Candle;
use crate::domain::config_validation::MAX_LIMIT;
use crate::domain::error::SpottraderError;
use crate::domain::pipeline::{normalize_ohlcv, recommend, recommend_advanced};
use crate::domain::recommendation::{AdvancedRecommendation, BasicRecommendation};
use crate::domain::timeframe::Timeframe;
use crate::domain::valuation::{value_balances, Balance, Valuation};

use super::{AppState, WebError};

pub const DEFAULT_KLINES_LIMIT: i64 = 300;
pub const DEFAULT_OHLCV_LIMIT: i64 = 500;

/// Run a blocking port call on the blocking pool, bounded by the configured
/// fetch timeout.
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, WebError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SpottraderError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(state.fetch_timeout, task).await {
        Ok(Ok(result)) => result.map_err(WebError::from),
        Ok(Err(join)) => Err(WebError::internal(format!("fetch task failed: {}", join))),
        Err(_) => Err(WebError::timeout(format!(
            "upstream fetch exceeded {}ms",
            state.fetch_timeout.as_millis()
        ))),
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, WebError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(WebError::bad_request(format!("{} is required", name))),
    }
}

fn checked_limit(limit: Option<i64>, default: i64) -> Result<usize, WebError> {
    let limit = limit.unwrap_or(default);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(WebError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(limit as usize)
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[derive(Debug, Deserialize)]
pub struct KlinesQuery {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct Kline {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
}

#[derive(Serialize)]
pub struct KlinesResponse {
    pub symbol: String,
    pub interval: String,
    pub klines: Vec<Kline>,
}

pub async fn klines(
    State(state): State<Arc<AppState>>,
    Query(q): Query<KlinesQuery>,
) -> Result<Json<KlinesResponse>, WebError> {
    let symbol = required(q.symbol, "symbol")?;
    let interval = required(q.interval, "interval")?;
    let limit = checked_limit(q.limit, DEFAULT_KLINES_LIMIT)?;
    let tf: Timeframe = interval.parse()?;

    let port = Arc::clone(&state.candles);
    let sym = symbol.clone();
    let candles = run_blocking(&state, move || port.fetch_candles(&sym, tf, limit)).await?;

    Ok(Json(KlinesResponse {
        symbol,
        interval: tf.to_string(),
        klines: candles
            .iter()
            .map(|c| Kline {
                t: c.timestamp,
                o: c.open,
                h: c.high,
                l: c.low,
                c: c.close,
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub symbol: Option<String>,
    pub interval: Option<String>,
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecommendationQuery>,
) -> Result<Json<BasicRecommendation>, WebError> {
    let symbol = required(q.symbol, "symbol")?;
    let interval = required(q.interval, "interval")?;
    interval.parse::<Timeframe>()?;

    let port = Arc::clone(&state.candles);
    let params = state.params;
    let rec = run_blocking(&state, move || recommend(&*port, &symbol, &interval, &params)).await?;
    Ok(Json(rec))
}

pub async fn advanced_recommendations(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecommendationQuery>,
) -> Result<Json<AdvancedRecommendation>, WebError> {
    let symbol = required(q.symbol, "symbol")?;
    let interval = required(q.interval, "interval")?;
    interval.parse::<Timeframe>()?;

    let port = Arc::clone(&state.candles);
    let params = state.params;
    let rec =
        run_blocking(&state, move || recommend_advanced(&*port, &symbol, &interval, &params)).await?;
    Ok(Json(rec))
}

#[derive(Debug, Deserialize)]
pub struct OhlcvQuery {
    pub symbol: Option<String>,
    pub tf: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct OhlcvCandle {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

impl From<&Candle> for OhlcvCandle {
    fn from(c: &Candle) -> Self {
        Self {
            t: c.timestamp,
            o: c.open,
            h: c.high,
            l: c.low,
            c: c.close,
            v: c.volume,
        }
    }
}

#[derive(Serialize)]
pub struct OhlcvResponse {
    pub symbol: String,
    pub timeframe: String,
    pub candles: Vec<OhlcvCandle>,
}

pub async fn market_ohlcv(
    State(state): State<Arc<AppState>>,
    Query(q): Query<OhlcvQuery>,
) -> Result<Json<OhlcvResponse>, WebError> {
    let symbol = required(q.symbol, "symbol")?;
    let tf = required(q.tf, "tf")?;
    let limit = checked_limit(q.limit, DEFAULT_OHLCV_LIMIT)?;
    let timeframe: Timeframe = tf.parse()?;

    let port = Arc::clone(&state.candles);
    let sym = symbol.clone();
    let candles = run_blocking(&state, move || {
        normalize_ohlcv(&*port, &sym, timeframe.as_str(), limit)
    })
    .await?;

    Ok(Json(OhlcvResponse {
        symbol,
        timeframe: timeframe.to_string(),
        candles: candles.iter().map(OhlcvCandle::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ValuationRequest {
    pub balances: Vec<Balance>,
}

pub async fn portfolio_valued(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValuationRequest>,
) -> Result<Json<Valuation>, WebError> {
    let prices = Arc::clone(&state.prices);
    let quotes = Arc::clone(&state.quotes);
    let quote_asset = state.quote_asset.clone();
    let valuation = run_blocking(&state, move || {
        Ok(value_balances(&req.balances, &quote_asset, &quotes, &*prices))
    })
    .await?;
    Ok(Json(valuation))
}

pub async fn not_found() -> WebError {
    WebError::new(axum::http::StatusCode::NOT_FOUND, "not found")
}
