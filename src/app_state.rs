// =============================================================================
// Central Application State — Tessa backend
// =============================================================================
//
// The single source of truth for the service. `load_frame` is the only write
// path for the published indicator frame: cache-or-fetch the history,
// validate, recompute the frame in full, publish, bump the version.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared state.
//   - The frame and cached series are shared as `Arc` snapshots; readers
//     never block a recompute.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::market_data::{CacheKey, DatasetCache, YahooClient};
use crate::pipeline::{IndicatorFrame, ReturnSummary};
use crate::runtime_config::{IndicatorParams, RuntimeConfig};

/// Maximum number of recent errors to retain for the dashboard error log.
const MAX_RECENT_ERRORS: usize = 50;

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Central application state shared across all tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter. Incremented on every
    /// meaningful state mutation so the frontend can cheaply poll for
    /// changes.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Downloaded histories, keyed by (symbol, start, end).
    pub cache: Arc<DatasetCache>,

    /// Market-data retrieval collaborator.
    pub provider: Arc<YahooClient>,

    /// Latest published indicator frame, if any load has succeeded yet.
    pub frame: RwLock<Option<Arc<IndicatorFrame>>>,

    pub last_refresh: RwLock<Option<DateTime<Utc>>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration.
    ///
    /// The returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            cache: Arc::new(DatasetCache::new()),
            provider: Arc::new(YahooClient::new()),
            frame: RwLock::new(None),
            last_refresh: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version. Call after every meaningful
    /// mutation.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The log is capped at [`MAX_RECENT_ERRORS`];
    /// oldest entries are evicted when the limit is reached.
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Frame Loading ───────────────────────────────────────────────────

    /// The cache key for the currently configured (symbol, range).
    pub fn current_cache_key(&self) -> CacheKey {
        let config = self.runtime_config.read();
        CacheKey {
            symbol: config.symbol.clone(),
            start: config.start_date,
            end: config.end_date,
        }
    }

    /// Load the configured history (from cache, or the provider on a miss),
    /// recompute the indicator frame from scratch and publish it.
    ///
    /// `force` invalidates the cache entry first, guaranteeing a fresh
    /// download. Errors are returned to the caller *and* pushed onto the
    /// dashboard error log.
    pub async fn load_frame(&self, force: bool) -> Result<Arc<IndicatorFrame>> {
        // Snapshot config before any await; the lock must not be held across
        // the fetch.
        let key = self.current_cache_key();
        let params = self.runtime_config.read().params.clone();

        if force && self.cache.invalidate(&key) {
            info!(key = %key, "cache entry invalidated for forced refresh");
        }

        let series = match self.cache.get(&key) {
            Some(series) => {
                debug!(key = %key, bars = series.len(), "history served from cache");
                series
            }
            None => {
                let fetched = self
                    .provider
                    .fetch_daily(&key.symbol, key.start, key.end)
                    .await
                    .map_err(|e| {
                        self.push_error(format!("history load failed for {key}: {e:#}"));
                        e
                    })?;
                let series = Arc::new(fetched);
                self.cache.insert(key.clone(), series.clone());
                series
            }
        };

        if series.len() < params.longest_window() {
            warn!(
                key = %key,
                bars = series.len(),
                needed = params.longest_window(),
                "series shorter than the longest indicator window; leading columns stay undefined"
            );
        }

        let frame = Arc::new(IndicatorFrame::compute(&series, &params));
        *self.frame.write() = Some(frame.clone());
        *self.last_refresh.write() = Some(Utc::now());
        self.increment_version();

        info!(key = %key, rows = frame.rows(), "indicator frame published");
        Ok(frame)
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build the status payload for `GET /api/v1/state`.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let config = self.runtime_config.read();
        let frame = self.frame.read().clone();

        let (rows, first_date, last_date, summary) = match &frame {
            Some(f) => (
                Some(f.rows()),
                f.dates.first().copied(),
                f.dates.last().copied(),
                f.return_summary(),
            ),
            None => (None, None, None, None),
        };

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            symbol: config.symbol.clone(),
            start_date: config.start_date,
            end_date: config.end_date,
            params: config.params.clone(),
            rows,
            first_date,
            last_date,
            summary,
            last_refresh: self.last_refresh.read().map(|t| t.to_rfc3339()),
            cache_entries: self.cache.len(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

// =============================================================================
// Serialisable snapshot (matches the frontend's status panel)
// =============================================================================

/// Service status snapshot for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,

    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub params: IndicatorParams,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReturnSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<String>,

    pub cache_entries: usize,
    pub uptime_secs: u64,
    pub recent_errors: Vec<ErrorRecord>,
}
