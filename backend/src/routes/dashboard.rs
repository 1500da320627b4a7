use super::{error_response, parse_horizon, parse_ticker, upstream_error, RouteError};
use crate::{
    models::{ChangeBaseline, Fundamentals},
    services::{
        dashboard_service::{self, DashboardError, DashboardRequest, DashboardView},
        market_service,
    },
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize, Default)]
pub struct DashboardQuery {
    pub ticker: Option<String>,
    pub horizon: Option<String>,
    pub baseline: Option<ChangeBaseline>,
    pub rsi_window: Option<usize>,
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, RouteError> {
    // No ticker selected means the first one in the list
    let ticker = match query.ticker.as_deref() {
        Some(raw) => parse_ticker(raw)?,
        None => state
            .config
            .tickers
            .first()
            .cloned()
            .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "No ticker selected"))?,
    };

    let req = DashboardRequest {
        ticker,
        horizon: parse_horizon(query.horizon.as_deref())?,
        baseline: query.baseline.unwrap_or_default(),
        rsi_window: query.rsi_window.unwrap_or(state.config.rsi_window),
    };

    let (history, info) = tokio::join!(
        market_service::load_price_history(&state, &req.ticker, req.horizon),
        market_service::load_fundamentals(&state, &req.ticker),
    );

    let history = history.map_err(|e| upstream_error("Error loading dashboard", &e))?;

    // Missing fundamentals still leave a usable chart; every field renders as N/A
    let info = info.unwrap_or_else(|e| {
        warn!(ticker = %req.ticker, "Rendering without fundamentals: {}", e);
        Fundamentals::default()
    });

    dashboard_service::render_dashboard(&req, &history, &info)
        .map(Json)
        .map_err(|e| match e {
            DashboardError::NoData(msg) => error_response(StatusCode::NOT_FOUND, msg),
            DashboardError::Indicator(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        })
}
