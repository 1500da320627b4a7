use crate::indicators::DEFAULT_RSI_WINDOW;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TICKERS: [&str; 6] = ["TSLA", "NVDA", "GOOG", "MSFT", "HOOD", "PLTR"];
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const MAX_CACHE_TTL_SECS: u64 = 86_400;
const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub cache_ttl: Duration,
    pub rsi_window: usize,
    pub yahoo_base_url: String,
    pub static_dir: PathBuf,
    pub tickers: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "Invalid {}={:?}: {}", key, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            rsi_window: DEFAULT_RSI_WINDOW,
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            static_dir: PathBuf::from("static"),
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        let addr = lookup("STARLIGHT_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        config.bind_addr = addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: "STARLIGHT_BIND_ADDR",
            value: addr.clone(),
            reason: e.to_string(),
        })?;

        if let Some(ttl) = lookup("STARLIGHT_CACHE_TTL_SECS") {
            let secs: u64 = ttl.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "STARLIGHT_CACHE_TTL_SECS",
                value: ttl.clone(),
                reason: e.to_string(),
            })?;
            if secs == 0 || secs > MAX_CACHE_TTL_SECS {
                return Err(ConfigError::Invalid {
                    key: "STARLIGHT_CACHE_TTL_SECS",
                    value: ttl,
                    reason: format!("must be between 1 and {}", MAX_CACHE_TTL_SECS),
                });
            }
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(window) = lookup("STARLIGHT_RSI_WINDOW") {
            let parsed: usize = window.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "STARLIGHT_RSI_WINDOW",
                    value: window.clone(),
                    reason: e.to_string(),
                }
            })?;
            if parsed == 0 {
                return Err(ConfigError::Invalid {
                    key: "STARLIGHT_RSI_WINDOW",
                    value: window,
                    reason: "must be positive".to_string(),
                });
            }
            config.rsi_window = parsed;
        }

        if let Some(url) = lookup("STARLIGHT_YAHOO_BASE_URL") {
            config.yahoo_base_url = url;
        }

        if let Some(dir) = lookup("STARLIGHT_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        if let Some(syms) = lookup("STARLIGHT_TICKERS") {
            let tickers: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !tickers.is_empty() {
                config.tickers = tickers;
            }
        }

        Ok(config)
    }
}
