use super::moving_averages::{EMA, SMA};
use super::IndicatorError;
use serde::Serialize;

pub const DEFAULT_RSI_WINDOW: usize = 14;

/// How average gains and losses are smoothed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoothing {
    /// Wilder's exponential smoothing (a = 1 / window)
    Wilder,
    /// Flat rolling mean over the window, kept as a comparison baseline
    Simple,
}

/// Where an RSI reading sits on the usual 30/70 bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(value: f64) -> Self {
        if value >= 70.0 {
            RsiZone::Overbought
        } else if value <= 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

/// Relative Strength Index (RSI)
/// Measures momentum by comparing magnitude of recent gains to recent losses
/// Returns values between 0-100:
/// - Below 30: Oversold (potentially undervalued)
/// - Above 70: Overbought (potentially overvalued)
#[derive(Debug, Clone, Copy)]
pub struct RSI {
    window: usize,
    smoothing: Smoothing,
}

impl RSI {
    pub fn new(window: usize, smoothing: Smoothing) -> Result<Self, IndicatorError> {
        if window == 0 {
            return Err(IndicatorError::InvalidArgument(
                "RSI window must be positive".to_string(),
            ));
        }
        Ok(Self { window, smoothing })
    }

    /// Calculate RSI for a close series
    /// Returns a vector of the same length as input
    /// First (window - 1) values will be NaN (warmup period)
    pub fn calculate(&self, closes: &[f64]) -> Vec<f64> {
        // The first close has no predecessor, so its change counts as zero.
        // A NaN change fails both comparisons inside max() and yields 0.0.
        let mut gains = Vec::with_capacity(closes.len());
        let mut losses = Vec::with_capacity(closes.len());
        for i in 0..closes.len() {
            let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
            gains.push(change.max(0.0));
            losses.push((-change).max(0.0));
        }

        let (avg_gain, avg_loss) = match self.smoothing {
            Smoothing::Wilder => {
                let ema = EMA::wilder(self.window);
                (ema.calculate(&gains), ema.calculate(&losses))
            }
            Smoothing::Simple => {
                let sma = SMA::new(self.window);
                (sma.calculate(&gains), sma.calculate(&losses))
            }
        };

        avg_gain
            .iter()
            .zip(avg_loss.iter())
            .map(|(&g, &l)| rsi_from_averages(g, l))
            .collect()
    }
}

/// RSI with Wilder's smoothing
pub fn compute_rsi(closes: &[f64], window: usize) -> Result<Vec<f64>, IndicatorError> {
    Ok(RSI::new(window, Smoothing::Wilder)?.calculate(closes))
}

/// RSI with a flat rolling mean in place of Wilder's smoothing
pub fn compute_rsi_simple(closes: &[f64], window: usize) -> Result<Vec<f64>, IndicatorError> {
    Ok(RSI::new(window, Smoothing::Simple)?.calculate(closes))
}

/// Most recent defined Wilder RSI value with its zone
pub fn current_rsi(closes: &[f64], window: usize) -> Result<Option<(f64, RsiZone)>, IndicatorError> {
    let series = compute_rsi(closes, window)?;
    Ok(series
        .into_iter()
        .rev()
        .find(|v| !v.is_nan())
        .map(|v| (v, RsiZone::classify(v))))
}

/// avg_loss == 0 saturates to 100; a flat run (both zero) reads as neutral 50.
/// NaN averages (warmup) stay NaN.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        return f64::NAN;
    }
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
