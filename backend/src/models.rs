use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub type Ticker = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Price history for one ticker over one horizon, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: Ticker,
    pub currency: Option<String>,
    /// Close of the session before the first candle, when the provider reports it
    pub previous_close: Option<f64>,
    pub candles: Vec<Candle>,
}

impl PriceHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.candles.iter().map(|c| c.timestamp.timestamp()).collect()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Lookback periods offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeHorizon {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    OneWeek,
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
}

impl TimeHorizon {
    pub const ALL: [TimeHorizon; 6] = [
        TimeHorizon::OneDay,
        TimeHorizon::OneWeek,
        TimeHorizon::OneMonth,
        TimeHorizon::OneYear,
        TimeHorizon::FiveYears,
        TimeHorizon::TenYears,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeHorizon::OneDay => "1 Day",
            TimeHorizon::OneWeek => "1 Week",
            TimeHorizon::OneMonth => "1 Month",
            TimeHorizon::OneYear => "1 Year",
            TimeHorizon::FiveYears => "5 Years",
            TimeHorizon::TenYears => "10 Years",
        }
    }

    /// Provider range code
    pub fn period(&self) -> &'static str {
        match self {
            TimeHorizon::OneDay => "1d",
            TimeHorizon::OneWeek => "5d",
            TimeHorizon::OneMonth => "1mo",
            TimeHorizon::OneYear => "1y",
            TimeHorizon::FiveYears => "5y",
            TimeHorizon::TenYears => "10y",
        }
    }

    /// Accepts either the period code ("1mo") or the label ("1 Month")
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|h| h.period().eq_ignore_ascii_case(input) || h.label().eq_ignore_ascii_case(input))
    }
}

/// What the period's percentage change is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeBaseline {
    #[default]
    FirstClose,
    FirstOpen,
    PreviousClose,
}

/// Named company fields from the provider, flattened to plain JSON values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub fields: HashMap<String, Value>,
}

impl Fundamentals {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(crate::format::coerce_number)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_horizon_parse() {
        assert_eq!(TimeHorizon::parse("1mo"), Some(TimeHorizon::OneMonth));
        assert_eq!(TimeHorizon::parse("5d"), Some(TimeHorizon::OneWeek));
        assert_eq!(TimeHorizon::parse("10 Years"), Some(TimeHorizon::TenYears));
        assert_eq!(TimeHorizon::parse(" 1y "), Some(TimeHorizon::OneYear));
        assert_eq!(TimeHorizon::parse("2w"), None);
        assert_eq!(TimeHorizon::default(), TimeHorizon::OneMonth);
    }

    #[test]
    fn test_horizon_serializes_as_period() {
        let s = serde_json::to_string(&TimeHorizon::OneWeek).unwrap();
        assert_eq!(s, "\"5d\"");
    }

    #[test]
    fn test_fundamentals_accessors() {
        let mut fields = HashMap::new();
        fields.insert("marketCap".to_string(), json!(1.5e12));
        fields.insert("longName".to_string(), json!("Tesla, Inc."));
        fields.insert("beta".to_string(), json!(null));
        fields.insert("shortName".to_string(), json!(""));
        let info = Fundamentals { fields };

        assert_eq!(info.get_f64("marketCap"), Some(1.5e12));
        assert_eq!(info.get_str("longName"), Some("Tesla, Inc."));
        assert!(info.get("beta").is_none());
        assert!(info.get_str("shortName").is_none());
        assert!(info.get_f64("missing").is_none());
    }
}
