use crate::format::{self, FormatIntent};
use crate::indicators::{self, IndicatorError, RsiZone};
use crate::models::*;
use serde::Serialize;
use serde_json::Value;

/// Everything a dashboard render depends on, passed explicitly per request
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub ticker: Ticker,
    pub horizon: TimeHorizon,
    pub baseline: ChangeBaseline,
    pub rsi_window: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub ticker: Ticker,
    pub company_name: String,
    pub horizon: TimeHorizon,
    pub horizon_label: &'static str,
    pub currency: Option<String>,
    pub metrics: Metrics,
    pub chart: ChartPayload,
    pub profile: String,
    pub financials: Vec<FinancialSection>,
    pub officers: Vec<OfficerRow>,
}

#[derive(Debug, Serialize)]
pub struct Metrics {
    pub current_price: f64,
    pub current_price_display: String,
    pub change_pct: f64,
    pub change_display: String,
    pub baseline: ChangeBaseline,
    pub eps: String,
    pub forward_pe: String,
    pub peg_ratio: String,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Serialize)]
pub struct ChartPayload {
    pub timestamps: Vec<i64>,
    pub candles: Vec<Candle>,
    pub rsi_window: usize,
    pub rsi: Vec<Option<f64>>,
    pub y_range: [f64; 2],
    pub trend: Trend,
}

#[derive(Debug, Serialize)]
pub struct FinancialSection {
    pub title: &'static str,
    pub rows: Vec<FinancialRow>,
}

#[derive(Debug, Serialize)]
pub struct FinancialRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct OfficerRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u64>,
    /// Total pay in millions, only when reported and non-zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pay_millions: Option<String>,
}

#[derive(Debug)]
pub enum DashboardError {
    NoData(String),
    Indicator(IndicatorError),
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::NoData(msg) => write!(f, "{}", msg),
            DashboardError::Indicator(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DashboardError {}

impl From<IndicatorError> for DashboardError {
    fn from(e: IndicatorError) -> Self {
        DashboardError::Indicator(e)
    }
}

type FieldSpec = (&'static str, &'static str, FormatIntent);

const FINANCIAL_SECTIONS: [(&str, &[FieldSpec]); 4] = [
    (
        "Valuation & Market",
        &[
            ("Market Cap", "marketCap", FormatIntent::Plain),
            ("Trailing P/E", "trailingPE", FormatIntent::Plain),
            ("Forward P/E", "forwardPE", FormatIntent::Plain),
            ("Beta (5Y Monthly)", "beta", FormatIntent::Plain),
            ("All-Time High", "allTimeHigh", FormatIntent::Unit("$")),
            ("Short Ratio", "shortRatio", FormatIntent::Plain),
        ],
    ),
    (
        "Growth & Targets",
        &[
            ("Quarterly Earnings Growth", "earningsQuarterlyGrowth", FormatIntent::Percent),
            ("Target High Price", "targetHighPrice", FormatIntent::Unit("$")),
            ("Target Mean Price", "targetMeanPrice", FormatIntent::Unit("$")),
            ("Target Low Price", "targetLowPrice", FormatIntent::Unit("$")),
        ],
    ),
    (
        "Cash & Debt",
        &[
            ("Total Cash", "totalCash", FormatIntent::Plain),
            ("Total Debt", "totalDebt", FormatIntent::Plain),
            ("Debt to Equity", "debtToEquity", FormatIntent::Plain),
            ("Free Cashflow", "freeCashflow", FormatIntent::Plain),
            ("Operating Cashflow", "operatingCashflow", FormatIntent::Plain),
            ("Gross Profits", "grossProfits", FormatIntent::Plain),
        ],
    ),
    (
        "Profitability Margins",
        &[
            ("Gross Margins", "grossMargins", FormatIntent::Percent),
            ("EBITDA Margins", "ebitdaMargins", FormatIntent::Percent),
            ("Operating Margins", "operatingMargins", FormatIntent::Percent),
            ("Profit Margins", "profitMargins", FormatIntent::Percent),
        ],
    ),
];

pub fn render_dashboard(
    req: &DashboardRequest,
    history: &PriceHistory,
    info: &Fundamentals,
) -> Result<DashboardView, DashboardError> {
    let (first, last) = match (history.candles.first(), history.candles.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(DashboardError::NoData(
                "No data found for this ticker and period.".to_string(),
            ))
        }
    };

    let closes = history.closes();
    let current_price = last.close;

    // previous_close falls back to the first close when the provider omits it
    let base = match req.baseline {
        ChangeBaseline::FirstClose => first.close,
        ChangeBaseline::FirstOpen => first.open,
        ChangeBaseline::PreviousClose => history.previous_close.unwrap_or(first.close),
    };
    let change_pct = (current_price - base) / base * 100.0;

    let rsi = indicators::to_optional(indicators::compute_rsi(&closes, req.rsi_window)?);
    let latest_rsi = indicators::current_rsi(&closes, req.rsi_window)?;

    let metrics = Metrics {
        current_price,
        current_price_display: format::format_price(current_price),
        change_pct,
        change_display: format::format_change_pct(change_pct),
        baseline: req.baseline,
        eps: format::format_fixed(info.get_f64("trailingEps"), "$"),
        forward_pe: format::format_fixed(info.get_f64("forwardPE"), ""),
        peg_ratio: format::format_fixed(info.get_f64("pegRatio"), ""),
        rsi: latest_rsi.map(|(value, _)| value),
        rsi_zone: latest_rsi.map(|(_, zone)| zone),
    };

    let chart = ChartPayload {
        timestamps: history.timestamps(),
        candles: history.candles.clone(),
        rsi_window: req.rsi_window,
        rsi,
        y_range: y_axis_range(&closes),
        trend: if current_price >= base { Trend::Up } else { Trend::Down },
    };

    Ok(DashboardView {
        ticker: req.ticker.clone(),
        company_name: info.get_str("longName").unwrap_or(&req.ticker).to_string(),
        horizon: req.horizon,
        horizon_label: req.horizon.label(),
        currency: history.currency.clone(),
        metrics,
        chart,
        profile: info
            .get_str("longBusinessSummary")
            .unwrap_or("No summary available.")
            .to_string(),
        financials: financial_sections(info),
        officers: officer_rows(info),
    })
}

pub fn financial_sections(info: &Fundamentals) -> Vec<FinancialSection> {
    FINANCIAL_SECTIONS
        .iter()
        .map(|&(title, fields)| FinancialSection {
            title,
            rows: fields
                .iter()
                .map(|&(label, key, intent)| FinancialRow {
                    label,
                    value: format::format_json(info.get(key), intent),
                })
                .collect(),
        })
        .collect()
}

/// Officers with at least one known attribute
pub fn officer_rows(info: &Fundamentals) -> Vec<OfficerRow> {
    let Some(officers) = info.get("companyOfficers").and_then(Value::as_array) else {
        return Vec::new();
    };

    officers
        .iter()
        .map(|officer| OfficerRow {
            name: officer.get("name").and_then(Value::as_str).map(str::to_string),
            title: officer.get("title").and_then(Value::as_str).map(str::to_string),
            age: officer.get("age").and_then(Value::as_u64),
            total_pay_millions: officer
                .get("totalPay")
                .and_then(format::coerce_number)
                .filter(|pay| *pay != 0.0)
                .map(format::format_millions),
        })
        .filter(|row| *row != OfficerRow::default())
        .collect()
}

/// Close range padded by 5%; a flat series pads by 5% of its level instead
fn y_axis_range(closes: &[f64]) -> [f64; 2] {
    let y_min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let padding = if y_max > y_min {
        (y_max - y_min) * 0.05
    } else {
        y_min * 0.05
    };
    [y_min - padding, y_max + padding]
}
