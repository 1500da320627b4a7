use super::{error_response, parse_ticker, upstream_error, RouteError};
use crate::{models::TimeHorizon, services::market_service, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct PriceQuery {
    pub ticker: String,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub ticker: String,
    pub price: f64,
    pub currency: Option<String>,
}

/// Latest close from the one-day history
pub async fn get_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceResponse>, RouteError> {
    let ticker = parse_ticker(&query.ticker)?;

    let history = market_service::load_price_history(&state, &ticker, TimeHorizon::OneDay)
        .await
        .map_err(|e| upstream_error("Error loading price", &e))?;

    let price = history.latest_close().ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("No price data found for ticker: {}", ticker),
        )
    })?;

    Ok(Json(PriceResponse {
        ticker,
        price,
        currency: history.currency,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{history, state_with_ttl};
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_price_from_cache() {
        let state = state_with_ttl(Duration::from_secs(600));
        state
            .store_history(TimeHorizon::OneDay, history("MSFT", &[410.0, 412.5]))
            .await;

        let Json(body) = get_price(
            State(state),
            Query(PriceQuery {
                ticker: "msft".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.ticker, "MSFT");
        assert_eq!(body.price, 412.5);
        assert_eq!(body.currency.as_deref(), Some("USD"));
    }

    #[tokio::test]
    async fn test_get_price_empty_history() {
        let state = state_with_ttl(Duration::from_secs(600));
        state.store_history(TimeHorizon::OneDay, history("MSFT", &[])).await;

        let (status, _) = get_price(
            State(state),
            Query(PriceQuery {
                ticker: "MSFT".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
