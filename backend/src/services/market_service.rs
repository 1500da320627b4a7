use crate::{
    api_client::ApiError,
    models::{Fundamentals, PriceHistory, TimeHorizon},
    state::AppState,
};
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info};

/// Price history for a ticker, served from the cache while fresh
pub async fn load_price_history(
    state: &AppState,
    ticker: &str,
    horizon: TimeHorizon,
) -> Result<PriceHistory, ApiError> {
    if let Some(history) = state.cached_history(ticker, horizon).await {
        debug!(ticker, period = horizon.period(), "price history cache hit");
        return Ok(history);
    }

    match state.client.fetch_price_history(ticker, horizon).await {
        Ok(history) => {
            info!(
                ticker,
                period = horizon.period(),
                candles = history.candles.len(),
                "Fetched price history"
            );
            state.store_history(horizon, history.clone()).await;
            Ok(history)
        }
        Err(e) => {
            error!(ticker, period = horizon.period(), "Failed to fetch price history: {}", e);
            Err(e)
        }
    }
}

pub async fn load_fundamentals(state: &AppState, ticker: &str) -> Result<Fundamentals, ApiError> {
    if let Some(info) = state.cached_fundamentals(ticker).await {
        debug!(ticker, "fundamentals cache hit");
        return Ok(info);
    }

    match state.client.fetch_fundamentals(ticker).await {
        Ok(info) => {
            info!(ticker, fields = info.fields.len(), "Fetched fundamentals");
            state.store_fundamentals(ticker, info.clone()).await;
            Ok(info)
        }
        Err(e) => {
            error!(ticker, "Failed to fetch fundamentals: {}", e);
            Err(e)
        }
    }
}

/// Evicts expired cache entries once per TTL
pub async fn start_cache_sweeper(state: AppState) {
    let period = state.config.cache_ttl.max(Duration::from_secs(1));
    let mut interval = time::interval(period);

    info!("Starting cache sweeper ({}s interval)", period.as_secs());

    loop {
        interval.tick().await;

        let removed = state.purge_expired().await;
        if removed > 0 {
            debug!(removed, "Evicted expired cache entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{history, state_with_ttl};

    #[tokio::test]
    async fn test_load_price_history_uses_fresh_cache() {
        let state = state_with_ttl(Duration::from_secs(600));
        state
            .store_history(TimeHorizon::OneYear, history("PLTR", &[20.0, 21.0, 22.0]))
            .await;

        let loaded = load_price_history(&state, "PLTR", TimeHorizon::OneYear)
            .await
            .unwrap();
        assert_eq!(loaded.closes(), vec![20.0, 21.0, 22.0]);
    }

    #[tokio::test]
    async fn test_load_fundamentals_uses_fresh_cache() {
        let state = state_with_ttl(Duration::from_secs(600));
        let mut info = Fundamentals::default();
        info.fields.insert("longName".to_string(), serde_json::json!("Palantir"));
        state.store_fundamentals("PLTR", info).await;

        let loaded = load_fundamentals(&state, "PLTR").await.unwrap();
        assert_eq!(loaded.get_str("longName"), Some("Palantir"));
    }
}
