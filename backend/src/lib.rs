//! Stock dashboard backend: price history with an RSI oscillator and
//! human-readable company fundamentals, served as JSON.

pub mod api_client;
pub mod config;
pub mod format;
pub mod indicators;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
