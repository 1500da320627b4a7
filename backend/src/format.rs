//! Magnitude-scaled number formatting for financial values.
//! Missing or unparseable input renders as "N/A", never as an error.

use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";

/// How a raw number should be rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatIntent {
    /// Auto-scaled to Trillion/Billion/Million, else a grouped plain number
    Plain,
    /// Fraction rendered as a percentage (0.156 -> "15.60%")
    Percent,
    /// Like Plain, with a unit appended to small (unscaled) numbers
    Unit(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinancialValue {
    pub raw: Option<f64>,
    pub intent: FormatIntent,
    pub multiplier: f64,
}

impl FinancialValue {
    pub fn new(raw: Option<f64>, intent: FormatIntent) -> Self {
        Self {
            raw,
            intent,
            multiplier: 1.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn render(&self) -> String {
        let Some(raw) = self.raw else {
            return NOT_AVAILABLE.to_string();
        };

        let num = raw * self.multiplier;
        if !num.is_finite() {
            return NOT_AVAILABLE.to_string();
        }

        if self.intent == FormatIntent::Percent {
            return format!("{:.2}%", num * 100.0);
        }

        let abs_num = num.abs();
        if abs_num >= 1e12 {
            format!("${:.2} Trillion", num / 1e12)
        } else if abs_num >= 1e9 {
            format!("${:.2} Billion", num / 1e9)
        } else if abs_num >= 1e6 {
            format!("${:.2} Million", num / 1e6)
        } else {
            let plain = group_thousands(num);
            match self.intent {
                FormatIntent::Unit(unit) if !unit.is_empty() => format!("{} {}", plain, unit),
                _ => plain,
            }
        }
    }
}

pub fn format_value(raw: Option<f64>, is_percent: bool, multiplier: f64) -> String {
    let intent = if is_percent {
        FormatIntent::Percent
    } else {
        FormatIntent::Plain
    };
    FinancialValue::new(raw, intent)
        .with_multiplier(multiplier)
        .render()
}

/// Format a provider field that may be missing, null, a number or a numeric string
pub fn format_json(raw: Option<&Value>, intent: FormatIntent) -> String {
    FinancialValue::new(raw.and_then(coerce_number), intent).render()
}

pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// "$1,234.56"
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("${}", group_thousands(price))
}

/// "+1.23%" / "-0.40%"
pub fn format_change_pct(pct: f64) -> String {
    if !pct.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:+.2}%", pct)
}

/// Two decimals with an optional prefix, no scaling ("12.34", "$5.67")
pub fn format_fixed(raw: Option<f64>, prefix: &str) -> String {
    match raw {
        Some(v) if v.is_finite() => format!("{}{:.2}", prefix, v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Raw dollar amount shown in millions ("$12.35")
pub fn format_millions(amount: f64) -> String {
    format_fixed(Some(amount / 1_000_000.0), "$")
}

fn group_thousands(num: f64) -> String {
    let fixed = format!("{:.2}", num.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if num.is_sign_negative() {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push('.');
    grouped.push_str(frac_part);
    grouped
}
