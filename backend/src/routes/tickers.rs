use crate::{models::TimeHorizon, state::AppState};
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HorizonOption {
    pub label: &'static str,
    pub period: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TickersResponse {
    pub tickers: Vec<String>,
    pub horizons: Vec<HorizonOption>,
    pub default_horizon: TimeHorizon,
    pub default_rsi_window: usize,
}

/// Selection lists for the dashboard controls
pub async fn get_tickers(State(state): State<AppState>) -> Json<TickersResponse> {
    Json(TickersResponse {
        tickers: state.config.tickers.clone(),
        horizons: TimeHorizon::ALL
            .iter()
            .map(|h| HorizonOption {
                label: h.label(),
                period: h.period(),
            })
            .collect(),
        default_horizon: TimeHorizon::default(),
        default_rsi_window: state.config.rsi_window,
    })
}
