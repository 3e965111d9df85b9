// =============================================================================
// Runtime Configuration — symbol, date range, and indicator settings
// =============================================================================
//
// Central configuration for the Tessa backend. The tracked symbol and date
// range can be changed at runtime through the API without a restart.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "ADANIPORTS.NS".to_string()
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid default start date")
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid default end date")
}

fn default_ma_fast() -> usize {
    20
}

fn default_ma_slow() -> usize {
    50
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_window() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Windows and widths for every indicator the pipeline computes.
///
/// The defaults are the classic dashboard settings: MA20/MA50, RSI-14,
/// MACD 12/26/9, Bollinger 20 ± 2σ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Fast simple moving average window.
    #[serde(default = "default_ma_fast")]
    pub ma_fast: usize,

    /// Slow simple moving average window.
    #[serde(default = "default_ma_slow")]
    pub ma_slow: usize,

    /// RSI look-back (Wilder's smoothing window).
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// MACD fast EMA period.
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    /// MACD slow EMA period.
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    /// Signal-line EMA period over the MACD line.
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// Bollinger Band window.
    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,

    /// Bollinger Band width in standard deviations.
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_fast: default_ma_fast(),
            ma_slow: default_ma_slow(),
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_window: default_bollinger_window(),
            bollinger_k: default_bollinger_k(),
        }
    }
}

impl IndicatorParams {
    /// Longest warm-up window of any configured indicator — the minimum
    /// series length for every column to carry at least one defined value.
    pub fn longest_window(&self) -> usize {
        [
            self.ma_fast,
            self.ma_slow,
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal,
            self.bollinger_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Tessa backend.
///
/// Exactly one symbol is tracked at a time. Every field has a serde default
/// so that older JSON files missing new fields still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Ticker the dashboard analyses (data-provider notation, e.g.
    /// "ADANIPORTS.NS").
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// First date of the requested history (inclusive).
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    /// End of the requested history (exclusive, like the original download
    /// range).
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,

    /// Indicator windows and widths.
    #[serde(default)]
    pub params: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            params: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            start = %config.start_date,
            end = %config.end_date,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
