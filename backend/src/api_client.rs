use crate::models::{Candle, Fundamentals, PriceHistory, TimeHorizon};
use chrono::DateTime;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; starlight-quant/0.1)";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";
// Hands out the session cookie that the crumb endpoint is keyed on
const COOKIE_URL: &str = "https://fc.yahoo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct ProviderError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    // Absent when the range has no sessions
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    chart_previous_close: Option<f64>,
}

#[derive(Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

// Columnar OHLCV; individual entries are null for halted/partial sessions
#[derive(Deserialize, Default)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Deserialize)]
struct SummaryBody {
    result: Option<Vec<Map<String, Value>>>,
    error: Option<ProviderError>,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    crumb: Mutex<Option<String>>,
}

#[derive(Debug)]
pub enum ApiError {
    RequestFailed(String),
    ParseError(String),
    NotFound(String),
    Unauthorized(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            ApiError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            crumb: Mutex::new(None),
        })
    }

    /// Daily candles for the horizon's range
    pub async fn fetch_price_history(
        &self,
        ticker: &str,
        horizon: TimeHorizon,
    ) -> Result<PriceHistory, ApiError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url,
            ticker,
            horizon.period()
        );

        let body = self.get_text(&url).await?;
        parse_chart(ticker, &body)
    }

    /// quoteSummary needs a session crumb; a rejected crumb is refreshed once
    pub async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ApiError> {
        match self.fetch_quote_summary(ticker).await {
            Err(ApiError::Unauthorized(msg)) => {
                debug!(ticker, "Crumb rejected ({}), refreshing session", msg);
                self.crumb.lock().await.take();
                self.fetch_quote_summary(ticker).await
            }
            other => other,
        }
    }

    async fn fetch_quote_summary(&self, ticker: &str) -> Result<Fundamentals, ApiError> {
        let crumb = self.crumb().await?;
        let url = summary_url(&self.base_url, ticker, &crumb)?;

        let body = self.get_text(url.as_str()).await?;
        parse_quote_summary(ticker, &body)
    }

    async fn crumb(&self) -> Result<String, ApiError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Usually answers 404, only the Set-Cookie header matters
        if let Err(e) = self.client.get(COOKIE_URL).send().await {
            warn!("Failed to obtain session cookie: {}", e);
        }

        let body = self
            .get_text(&format!("{}/v1/test/getcrumb", self.base_url))
            .await?;
        let crumb = parse_crumb(&body)?;
        debug!("Obtained new session crumb");

        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(format!("{} returned {}", url, status)));
        }

        // 404 bodies still carry the provider's error payload, let the parser report it
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(ApiError::RequestFailed(format!("{} returned {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| ApiError::ParseError(format!("Failed to get response text: {}", e)))
    }
}

pub(crate) fn summary_url(base_url: &str, ticker: &str, crumb: &str) -> Result<reqwest::Url, ApiError> {
    reqwest::Url::parse_with_params(
        &format!("{}/v10/finance/quoteSummary/{}", base_url, ticker),
        &[("modules", SUMMARY_MODULES), ("crumb", crumb)],
    )
    .map_err(|e| ApiError::ParseError(format!("Invalid quote summary URL: {}", e)))
}

/// The crumb endpoint answers with the bare token, or an HTML/JSON page when refused
pub(crate) fn parse_crumb(body: &str) -> Result<String, ApiError> {
    let crumb = body.trim();
    if crumb.is_empty() || crumb.contains(|c: char| matches!(c, '<' | '{') || c.is_whitespace()) {
        return Err(ApiError::Unauthorized(format!("No crumb in response: {:.60}", crumb)));
    }
    Ok(crumb.to_string())
}

/// Only an unknown symbol is a miss, other provider codes are upstream failures
fn provider_error(err: ProviderError) -> ApiError {
    let msg = format!("{}: {}", err.code, err.description);
    match err.code.as_str() {
        "Not Found" => ApiError::NotFound(msg),
        "Unauthorized" => ApiError::Unauthorized(msg),
        _ => ApiError::RequestFailed(msg),
    }
}

pub(crate) fn parse_chart(ticker: &str, body: &str) -> Result<PriceHistory, ApiError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| ApiError::ParseError(format!("Failed to parse chart for {}: {}", ticker, e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(provider_error(err));
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ApiError::NotFound(format!("No chart data for {}", ticker)))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = column_value(&quote.close, i) else {
            continue;
        };

        let timestamp = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| ApiError::ParseError(format!("Invalid timestamp {}", ts)))?;

        candles.push(Candle {
            timestamp,
            open: column_value(&quote.open, i).unwrap_or(close),
            high: column_value(&quote.high, i).unwrap_or(close),
            low: column_value(&quote.low, i).unwrap_or(close),
            close,
            volume: column_value(&quote.volume, i).map(|v| v.max(0.0) as u64).unwrap_or(0),
        });
    }

    // Sort by timestamp (ascending); a repeated timestamp keeps its first row
    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);

    Ok(PriceHistory {
        ticker: ticker.to_string(),
        currency: result.meta.currency,
        previous_close: result.meta.chart_previous_close,
        candles,
    })
}

pub(crate) fn parse_quote_summary(ticker: &str, body: &str) -> Result<Fundamentals, ApiError> {
    let envelope: SummaryEnvelope = serde_json::from_str(body).map_err(|e| {
        ApiError::ParseError(format!("Failed to parse quote summary for {}: {}", ticker, e))
    })?;

    if let Some(err) = envelope.quote_summary.error {
        return Err(provider_error(err));
    }

    let modules = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ApiError::NotFound(format!("No quote summary for {}", ticker)))?;

    let mut fields = HashMap::new();
    for (_, module) in modules {
        let Value::Object(entries) = module else {
            continue;
        };
        for (key, value) in entries {
            fields.entry(key).or_insert_with(|| unwrap_raw(value));
        }
    }

    Ok(Fundamentals { fields })
}

fn column_value(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten().filter(|v| v.is_finite())
}

/// {"raw": 1.2, "fmt": "1.20"} -> 1.2, and {} (field not reported) -> null
fn unwrap_raw(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(raw) = map.remove("raw") {
                raw
            } else if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map.into_iter().map(|(k, v)| (k, unwrap_raw(v))).collect())
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_raw).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_body() -> String {
        json!({
            "chart": {
                "result": [{
                    "meta": { "currency": "USD", "symbol": "TSLA", "chartPreviousClose": 240.0 },
                    "timestamp": [1700172800, 1700000000, 1700086400, 1700259200],
                    "indicators": {
                        "quote": [{
                            "open":   [252.0, 241.0, 245.0, 255.0],
                            "high":   [256.0, 246.0, 251.0, null],
                            "low":    [249.0, 239.5, 244.0, 250.0],
                            "close":  [254.5, 245.0, 250.0, null],
                            "volume": [900, 1000, 1100, null]
                        }]
                    }
                }],
                "error": null
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_chart_drops_null_closes_and_sorts() {
        let history = parse_chart("TSLA", &chart_body()).unwrap();

        assert_eq!(history.ticker, "TSLA");
        assert_eq!(history.currency.as_deref(), Some("USD"));
        assert_eq!(history.previous_close, Some(240.0));
        assert_eq!(history.closes(), vec![245.0, 250.0, 254.5]);
        assert_eq!(history.timestamps(), vec![1700000000, 1700086400, 1700172800]);
        assert_eq!(history.candles[0].volume, 1000);
        assert_eq!(history.candles[2].high, 256.0);
    }

    #[test]
    fn test_parse_chart_fills_missing_ohlc_from_close() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": {},
                    "timestamp": [1700000000],
                    "indicators": { "quote": [{ "close": [10.0] }] }
                }],
                "error": null
            }
        })
        .to_string();

        let history = parse_chart("X", &body).unwrap();
        let candle = &history.candles[0];
        assert_eq!((candle.open, candle.high, candle.low, candle.volume), (10.0, 10.0, 10.0, 0));
        assert!(history.previous_close.is_none());
    }

    #[test]
    fn test_parse_chart_dedups_timestamps() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": {},
                    "timestamp": [1700000000, 1700000000, 1700086400],
                    "indicators": { "quote": [{ "close": [1.0, 2.0, 3.0] }] }
                }],
                "error": null
            }
        })
        .to_string();

        let history = parse_chart("X", &body).unwrap();
        assert_eq!(history.closes(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_parse_chart_provider_error() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        })
        .to_string();

        let err = parse_chart("NOPE", &body).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_parse_chart_empty_range() {
        let body = json!({
            "chart": {
                "result": [{ "meta": { "currency": "USD" }, "indicators": { "quote": [{}] } }],
                "error": null
            }
        })
        .to_string();

        let history = parse_chart("TSLA", &body).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_parse_chart_garbage() {
        let err = parse_chart("TSLA", "<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[test]
    fn test_parse_quote_summary_flattens_modules() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "longName": "Tesla, Inc.",
                        "marketCap": { "raw": 780000000000.0, "fmt": "780B", "longFmt": "780,000,000,000" }
                    },
                    "summaryDetail": {
                        "marketCap": { "raw": 1.0, "fmt": "1" },
                        "trailingPE": { "raw": 70.5, "fmt": "70.50" },
                        "beta": {}
                    },
                    "assetProfile": {
                        "longBusinessSummary": "Makes cars.",
                        "companyOfficers": [
                            { "name": "Elon Musk", "title": "CEO", "age": 52, "totalPay": { "raw": 0 } }
                        ]
                    }
                }],
                "error": null
            }
        })
        .to_string();

        let info = parse_quote_summary("TSLA", &body).unwrap();

        assert_eq!(info.get_str("longName"), Some("Tesla, Inc."));
        assert_eq!(info.get_f64("trailingPE"), Some(70.5));
        assert!(info.get("beta").is_none());
        assert_eq!(info.get_str("longBusinessSummary"), Some("Makes cars."));
        // First module in key order wins for fields reported twice
        assert_eq!(info.get_f64("marketCap"), Some(780000000000.0));

        let officers = info.get("companyOfficers").unwrap();
        assert_eq!(officers[0]["totalPay"], json!(0));
        assert_eq!(officers[0]["name"], json!("Elon Musk"));
    }

    #[test]
    fn test_parse_quote_summary_error() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": { "code": "Unauthorized", "description": "Invalid Crumb" }
            }
        })
        .to_string();

        assert!(matches!(
            parse_quote_summary("TSLA", &body),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_provider_error_codes() {
        let error_body = |code: &str| {
            json!({
                "chart": { "result": null, "error": { "code": code, "description": "x" } }
            })
            .to_string()
        };

        assert!(matches!(parse_chart("X", &error_body("Not Found")), Err(ApiError::NotFound(_))));
        assert!(matches!(
            parse_chart("X", &error_body("Unauthorized")),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            parse_chart("X", &error_body("Bad Request")),
            Err(ApiError::RequestFailed(_))
        ));
        assert!(matches!(
            parse_chart("X", &error_body("Too Many Requests")),
            Err(ApiError::RequestFailed(_))
        ));

        let summary = json!({
            "quoteSummary": { "result": null, "error": { "code": "Not Found", "description": "Quote not found for symbol: NOPE" } }
        })
        .to_string();
        assert!(matches!(parse_quote_summary("NOPE", &summary), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_summary_url_carries_crumb() {
        let url = summary_url("https://query1.finance.yahoo.com", "TSLA", "ab/C.d1").unwrap();

        assert_eq!(url.path(), "/v10/finance/quoteSummary/TSLA");
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["crumb"], "ab/C.d1");
        assert_eq!(params["modules"], SUMMARY_MODULES);
        assert!(!url.as_str().contains("ab/C"));
    }

    #[test]
    fn test_parse_crumb() {
        assert_eq!(parse_crumb("  xYz.12/ab\n").unwrap(), "xYz.12/ab");
        assert!(matches!(parse_crumb(""), Err(ApiError::Unauthorized(_))));
        assert!(matches!(
            parse_crumb("<html>Too Many Requests</html>"),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            parse_crumb(r#"{"finance":{"error":{"code":"Unauthorized"}}}"#),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_client_builds() {
        assert!(ApiClient::new("https://query1.finance.yahoo.com/").is_ok());
    }
}
