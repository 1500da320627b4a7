// Technical indicators module
// Pure calculation functions over close series, no I/O

pub mod moving_averages;
pub mod rsi;

pub use moving_averages::{EMA, SMA};
pub use rsi::{compute_rsi, compute_rsi_simple, current_rsi, RsiZone, Smoothing, DEFAULT_RSI_WINDOW, RSI};

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorError {
    InvalidArgument(String),
}

impl std::fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for IndicatorError {}

/// NaN marks an undefined (warmup) position; serialize those as null
pub fn to_optional(values: Vec<f64>) -> Vec<Option<f64>> {
    values
        .into_iter()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .collect()
}
