use crate::api_client::ApiError;
use crate::models::{Ticker, TimeHorizon};
use axum::{http::StatusCode, Json};
use serde::Serialize;

pub mod dashboard;
pub mod indicators;
pub mod price;
pub mod tickers;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type RouteError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, error: impl Into<String>) -> RouteError {
    (status, Json(ErrorResponse { error: error.into() }))
}

/// Unknown symbols are 404, anything else upstream is a bad gateway
pub fn upstream_error(context: &str, err: &ApiError) -> RouteError {
    let status = match err {
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::RequestFailed(_) | ApiError::ParseError(_) | ApiError::Unauthorized(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    error_response(status, format!("{}: {}", context, err))
}

pub fn parse_ticker(raw: &str) -> Result<Ticker, RouteError> {
    let ticker = raw.trim().to_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= 15
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

    if valid {
        Ok(ticker)
    } else {
        Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid ticker: {:?}", raw),
        ))
    }
}

pub fn parse_horizon(raw: Option<&str>) -> Result<TimeHorizon, RouteError> {
    match raw {
        None => Ok(TimeHorizon::default()),
        Some(s) => TimeHorizon::parse(s).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Unknown time horizon: {}. Use one of 1d, 5d, 1mo, 1y, 5y, 10y", s),
            )
        }),
    }
}
