/// Simple Moving Average (SMA)
/// Calculates the arithmetic mean of the last N values
pub struct SMA {
    period: usize,
}

impl SMA {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate SMA for a series
    /// Returns a vector of the same length as input
    /// First (period - 1) values will be NaN (warmup period)
    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; values.len()];

        if self.period == 0 || values.len() < self.period {
            return result;
        }

        // Summed per window rather than as a running total so an all-zero
        // window averages to exactly 0.0
        for i in (self.period - 1)..values.len() {
            let window_start = i + 1 - self.period;
            let window = &values[window_start..=i];
            let sum: f64 = window.iter().sum();
            result[i] = sum / self.period as f64;
        }

        result
    }
}

/// Exponential Moving Average (EMA)
/// Non-adjusted recursive filter: EMA(0) = x(0), EMA(t) = x(t) * a + EMA(t-1) * (1 - a)
/// Values before `min_periods` observations are NaN
pub struct EMA {
    alpha: f64,
    min_periods: usize,
}

impl EMA {
    /// Span-based EMA, a = 2 / (period + 1)
    pub fn new(period: usize) -> Self {
        Self {
            alpha: 2.0 / (period as f64 + 1.0),
            min_periods: period,
        }
    }

    /// Wilder's smoothing, a = 1 / period
    pub fn wilder(period: usize) -> Self {
        Self {
            alpha: 1.0 / period as f64,
            min_periods: period,
        }
    }

    /// Smoothing factor (a) used by the recursion
    pub fn smoothing_factor(&self) -> f64 {
        self.alpha
    }

    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; values.len()];

        if self.min_periods == 0 || values.len() < self.min_periods {
            return result;
        }

        let a = self.smoothing_factor();
        let mut ema = values[0];
        let warmup = self.min_periods - 1;

        for (i, &value) in values.iter().enumerate() {
            if i > 0 {
                ema = value * a + ema * (1.0 - a);
            }
            if i >= warmup {
                result[i] = ema;
            }
        }

        result
    }
}
