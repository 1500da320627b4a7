use super::{error_response, parse_horizon, parse_ticker, upstream_error, RouteError};
use crate::{
    indicators::{compute_rsi, compute_rsi_simple, to_optional, IndicatorError, EMA, SMA},
    models::TimeHorizon,
    services::market_service,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MIN_PERIOD: usize = 2;
const MAX_PERIOD: usize = 200;

#[derive(Deserialize)]
pub struct IndicatorQuery {
    pub ticker: String,
    pub horizon: Option<String>,
    pub indicators: String, // comma-separated: "rsi_14,rsi-sma_14,sma_20,ema_12"
}

#[derive(Debug, Serialize)]
pub struct IndicatorResponse {
    pub ticker: String,
    pub horizon: TimeHorizon,
    pub timestamps: Vec<i64>,
    pub closes: Vec<f64>,
    pub indicators: HashMap<String, Vec<Option<f64>>>,
}

/// Parsed "type_period" token
#[derive(Debug, Clone, Copy, PartialEq)]
enum IndicatorSpec {
    Rsi(usize),
    RsiSimple(usize),
    Sma(usize),
    Ema(usize),
}

impl IndicatorSpec {
    fn parse(token: &str) -> Option<Self> {
        let (kind, period) = token.rsplit_once('_')?;
        let period: usize = period.parse().ok()?;
        if !(MIN_PERIOD..=MAX_PERIOD).contains(&period) {
            return None;
        }

        match kind {
            "rsi" => Some(IndicatorSpec::Rsi(period)),
            "rsi-sma" => Some(IndicatorSpec::RsiSimple(period)),
            "sma" => Some(IndicatorSpec::Sma(period)),
            "ema" => Some(IndicatorSpec::Ema(period)),
            _ => None,
        }
    }

    fn calculate(&self, closes: &[f64]) -> Vec<f64> {
        match *self {
            IndicatorSpec::Rsi(p) => undefined_on_error(compute_rsi(closes, p), closes.len()),
            IndicatorSpec::RsiSimple(p) => {
                undefined_on_error(compute_rsi_simple(closes, p), closes.len())
            }
            IndicatorSpec::Sma(p) => SMA::new(p).calculate(closes),
            IndicatorSpec::Ema(p) => EMA::new(p).calculate(closes),
        }
    }
}

// Periods are validated to be >= MIN_PERIOD before this is reached
fn undefined_on_error(result: Result<Vec<f64>, IndicatorError>, len: usize) -> Vec<f64> {
    result.unwrap_or_else(|_| vec![f64::NAN; len])
}

pub async fn get_indicators(
    State(state): State<AppState>,
    Query(query): Query<IndicatorQuery>,
) -> Result<Json<IndicatorResponse>, RouteError> {
    let ticker = parse_ticker(&query.ticker)?;
    let horizon = parse_horizon(query.horizon.as_deref())?;

    let history = market_service::load_price_history(&state, &ticker, horizon)
        .await
        .map_err(|e| upstream_error("Error loading indicators", &e))?;

    if history.is_empty() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            format!("No price data found for ticker: {}", ticker),
        ));
    }

    let closes = history.closes();
    let mut indicators = HashMap::new();

    for token in query.indicators.split(',').map(|s| s.trim()) {
        // Skip malformed or unknown indicator strings
        let Some(spec) = IndicatorSpec::parse(token) else {
            continue;
        };

        let values = spec.calculate(&closes);
        indicators.insert(token.to_string(), to_optional(values));
    }

    Ok(Json(IndicatorResponse {
        ticker,
        horizon,
        timestamps: history.timestamps(),
        closes,
        indicators,
    }))
}
