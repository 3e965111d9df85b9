// =============================================================================
// Yahoo Finance Chart Client — daily OHLCV download
// =============================================================================
//
// The market-data retrieval collaborator. Downloads the daily history for one
// symbol over a half-open [start, end) date range from the public v8 chart
// endpoint. No authentication is required.
//
// Yahoo reports each field as a column array aligned with a `timestamp`
// array, and individual entries may be null (halted sessions, data gaps).
// Rows with any missing field are dropped here so the pipeline only ever
// sees complete bars.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::types::{DailyBar, PriceSeries};

/// HTTP client for the Yahoo Finance v8 chart API.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            // Yahoo rejects requests without a browser-ish user agent.
            .user_agent("Mozilla/5.0 (compatible; tessa/1.0)")
            .build()
            .expect("failed to build reqwest client");

        debug!("YahooClient initialised (base_url=https://query1.finance.yahoo.com)");

        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            client,
        }
    }

    /// Override the endpoint base URL (tests point this at a local server).
    #[cfg(test)]
    pub(crate) fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut c = Self::new();
        c.base_url = base_url.into();
        c
    }

    /// Download the daily bars for `symbol` over `[start, end)` and build a
    /// validated series.
    ///
    /// Fails on transport errors, a provider-side error payload, or a payload
    /// that survives parsing but violates the series invariants.
    #[instrument(skip(self), name = "yahoo::fetch_daily")]
    pub async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let period1 = unix_seconds(start);
        let period2 = unix_seconds(end);
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, symbol, period1, period2
        );

        info!(symbol = %symbol, start = %start, end = %end, "fetching daily history");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("chart request failed")?;

        let status = resp.status();
        let body = resp.text().await.context("failed to read chart response")?;

        if !status.is_success() {
            bail!("chart request returned HTTP {status}: {body}");
        }

        let bars = parse_chart_response(&body)
            .with_context(|| format!("failed to parse chart response for {symbol}"))?;

        let series =
            PriceSeries::new(bars).context("provider returned an invalid price series")?;

        info!(
            symbol = %symbol,
            bars = series.len(),
            first = %series.first_date(),
            last = %series.last_date(),
            "daily history downloaded"
        );

        Ok(series)
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Midnight UTC of `date` as unix seconds — the chart API's period encoding.
fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp()
}

/// Parse a v8 chart payload into daily bars, dropping incomplete rows.
///
/// Expected shape:
/// ```json
/// { "chart": { "result": [ {
///     "timestamp": [ ... ],
///     "indicators": { "quote": [ { "open": [...], "high": [...],
///                                  "low": [...], "close": [...],
///                                  "volume": [...] } ] }
/// } ], "error": null } }
/// ```
fn parse_chart_response(text: &str) -> Result<Vec<DailyBar>> {
    let root: serde_json::Value =
        serde_json::from_str(text).context("failed to parse chart JSON")?;

    let chart = &root["chart"];

    // The provider reports failures (unknown symbol, bad range) in-band.
    let error = &chart["error"];
    if !error.is_null() {
        let code = error["code"].as_str().unwrap_or("unknown");
        let description = error["description"].as_str().unwrap_or("no description");
        bail!("provider error {code}: {description}");
    }

    let result = chart["result"]
        .get(0)
        .context("missing field chart.result[0]")?;

    let timestamps = result["timestamp"]
        .as_array()
        .context("missing field timestamp")?;

    let quote = result["indicators"]["quote"]
        .get(0)
        .context("missing field indicators.quote[0]")?;

    let opens = quote["open"].as_array().context("missing field open")?;
    let highs = quote["high"].as_array().context("missing field high")?;
    let lows = quote["low"].as_array().context("missing field low")?;
    let closes = quote["close"].as_array().context("missing field close")?;
    let volumes = quote["volume"].as_array().context("missing field volume")?;

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;

    for (i, ts) in timestamps.iter().enumerate() {
        let Some(ts) = ts.as_i64() else {
            dropped += 1;
            continue;
        };

        // Any null field makes the row unusable — drop it whole.
        let row = (
            opens.get(i).and_then(serde_json::Value::as_f64),
            highs.get(i).and_then(serde_json::Value::as_f64),
            lows.get(i).and_then(serde_json::Value::as_f64),
            closes.get(i).and_then(serde_json::Value::as_f64),
            volumes.get(i).and_then(serde_json::Value::as_f64),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
            dropped += 1;
            continue;
        };

        let date = DateTime::from_timestamp(ts, 0)
            .with_context(|| format!("timestamp {ts} out of range at row {i}"))?
            .date_naive();

        bars.push(DailyBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if dropped > 0 {
        warn!(dropped, "dropped incomplete rows from chart response");
    }

    Ok(bars)
}
