//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over the market-data source (EODHD over
//! HTTP in production, in-memory mocks in tests) so the batch downloader and
//! the CLI never depend on a concrete transport.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One daily OHLCV bar for one ticker, as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: u64,
}

/// Structured error types for data operations.
///
/// Every failure is typed so callers can distinguish "not found" from
/// "malformed" from "transport". Nothing is logged-and-swallowed.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("API token is missing or empty")]
    MissingToken,

    #[error("network error: {0}")]
    Transport(String),

    #[error("rate limited by provider (HTTP 429)")]
    RateLimited,

    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("exchange not found: {exchange}")]
    ExchangeNotFound { exchange: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("malformed table in {path}: {reason}")]
    MalformedTable { path: PathBuf, reason: String },
}

/// Result of a successful fetch for a single ticker.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: String,
    /// Bars sorted by date ascending.
    pub bars: Vec<PriceBar>,
}

/// Trait for historical price providers.
///
/// One call, one ticker, blocking. No retry: any fault is terminal for the
/// ticker it occurred on; the batch layer above decides what to do next.
pub trait PriceProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a ticker from `from` to the present.
    fn fetch(&self, ticker: &str, from: NaiveDate) -> Result<FetchResult, DataError>;
}

/// Progress callback for multi-ticker downloads.
pub trait DownloadProgress {
    /// Called when starting to fetch a ticker.
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    /// Called when a ticker fetch completes.
    fn on_complete(&self, ticker: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, downloaded: usize, skipped: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {ticker}...", index + 1, total);
    }

    fn on_complete(
        &self,
        ticker: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {ticker}"),
            Err(e) => println!("  SKIP: {ticker}: {e}"),
        }
    }

    fn on_batch_complete(&self, downloaded: usize, skipped: usize, total: usize) {
        println!("\nDownload complete: {downloaded}/{total} downloaded, {skipped} skipped");
    }
}

/// Progress reporter that does nothing (library callers, tests).
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn on_start(&self, _ticker: &str, _index: usize, _total: usize) {}
    fn on_complete(
        &self,
        _ticker: &str,
        _index: usize,
        _total: usize,
        _result: &Result<(), DataError>,
    ) {
    }
    fn on_batch_complete(&self, _downloaded: usize, _skipped: usize, _total: usize) {}
}
