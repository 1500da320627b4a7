use crate::api_client::{ApiClient, ApiError};
use crate::config::Config;
use crate::models::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Cached<T> {
    fetched_at: Instant,
    value: T,
}

impl<T: Clone> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            fetched_at: Instant::now(),
            value,
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub client: Arc<ApiClient>,
    pub config: Arc<Config>,
}

#[derive(Default)]
pub struct AppStateInner {
    histories: HashMap<(Ticker, TimeHorizon), Cached<PriceHistory>>,
    fundamentals: HashMap<Ticker, Cached<Fundamentals>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let client = ApiClient::new(config.yahoo_base_url.clone())?;

        Ok(Self {
            inner: Arc::new(RwLock::new(AppStateInner::default())),
            client: Arc::new(client),
            config: Arc::new(config),
        })
    }

    pub async fn cached_history(&self, ticker: &str, horizon: TimeHorizon) -> Option<PriceHistory> {
        let state = self.inner.read().await;
        state
            .histories
            .get(&(ticker.to_string(), horizon))
            .and_then(|c| c.fresh(self.config.cache_ttl))
    }

    pub async fn store_history(&self, horizon: TimeHorizon, history: PriceHistory) {
        let mut state = self.inner.write().await;
        state
            .histories
            .insert((history.ticker.clone(), horizon), Cached::new(history));
    }

    pub async fn cached_fundamentals(&self, ticker: &str) -> Option<Fundamentals> {
        let state = self.inner.read().await;
        state
            .fundamentals
            .get(ticker)
            .and_then(|c| c.fresh(self.config.cache_ttl))
    }

    pub async fn store_fundamentals(&self, ticker: &str, info: Fundamentals) {
        let mut state = self.inner.write().await;
        state.fundamentals.insert(ticker.to_string(), Cached::new(info));
    }

    /// Drops expired entries, returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.config.cache_ttl;
        let mut state = self.inner.write().await;

        let before = state.histories.len() + state.fundamentals.len();
        state.histories.retain(|_, c| c.fetched_at.elapsed() < ttl);
        state.fundamentals.retain(|_, c| c.fetched_at.elapsed() < ttl);
        before - (state.histories.len() + state.fundamentals.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::DateTime;

    pub(crate) fn history(ticker: &str, closes: &[f64]) -> PriceHistory {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: DateTime::from_timestamp(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close - 1.0,
                high: close + 2.0,
                low: close - 2.0,
                close,
                volume: 1_000,
            })
            .collect();

        PriceHistory {
            ticker: ticker.to_string(),
            currency: Some("USD".to_string()),
            previous_close: closes.first().map(|c| c - 5.0),
            candles,
        }
    }

    pub(crate) fn state_with_ttl(ttl: Duration) -> AppState {
        AppState::new(Config {
            cache_ttl: ttl,
            ..Config::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_history_cache_hit() {
        let state = state_with_ttl(Duration::from_secs(600));
        state
            .store_history(TimeHorizon::OneMonth, history("TSLA", &[1.0, 2.0]))
            .await;

        let cached = state.cached_history("TSLA", TimeHorizon::OneMonth).await;
        assert_eq!(cached.map(|h| h.closes()), Some(vec![1.0, 2.0]));

        assert!(state.cached_history("TSLA", TimeHorizon::OneYear).await.is_none());
        assert!(state.cached_history("NVDA", TimeHorizon::OneMonth).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_miss_and_purge() {
        let state = state_with_ttl(Duration::ZERO);
        state
            .store_history(TimeHorizon::OneMonth, history("TSLA", &[1.0]))
            .await;
        state.store_fundamentals("TSLA", Fundamentals::default()).await;

        assert!(state.cached_history("TSLA", TimeHorizon::OneMonth).await.is_none());
        assert!(state.cached_fundamentals("TSLA").await.is_none());
        assert_eq!(state.purge_expired().await, 2);
        assert_eq!(state.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_fundamentals_cache_hit() {
        let state = state_with_ttl(Duration::from_secs(600));
        state.store_fundamentals("NVDA", Fundamentals::default()).await;

        assert!(state.cached_fundamentals("NVDA").await.is_some());
        assert_eq!(state.purge_expired().await, 0);
    }
}
