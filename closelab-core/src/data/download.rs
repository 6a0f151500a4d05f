//! Batch download orchestrator.
//!
//! Fetches each ticker independently and persists it to the store. A failure
//! for one ticker is recorded as a skip and never aborts the batch; the
//! summary carries exact counts and the skipped tickers in input order.

use super::provider::{DataError, DownloadProgress, PriceProvider};
use super::store::CsvStore;
use chrono::NaiveDate;

/// Download a list of tickers sequentially, storing each on success.
pub fn download_tickers(
    provider: &dyn PriceProvider,
    store: &CsvStore,
    tickers: &[&str],
    from: NaiveDate,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = tickers.len();
    let mut downloaded = 0;
    let mut skipped_tickers: Vec<String> = Vec::new();
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);

        let result = download_single(provider, store, ticker, from);
        progress.on_complete(ticker, i, total, &result);

        match result {
            Ok(()) => downloaded += 1,
            Err(e) => {
                skipped_tickers.push(ticker.to_string());
                errors.push((ticker.to_string(), e));
            }
        }
    }

    let skipped = skipped_tickers.len();
    progress.on_batch_complete(downloaded, skipped, total);

    DownloadSummary {
        total,
        downloaded,
        skipped,
        skipped_tickers,
        errors,
    }
}

/// Download one ticker: fetch then persist.
fn download_single(
    provider: &dyn PriceProvider,
    store: &CsvStore,
    ticker: &str,
    from: NaiveDate,
) -> Result<(), DataError> {
    let fetched = provider.fetch(ticker, from)?;
    store.write(ticker, &fetched.bars)?;
    Ok(())
}

/// Summary of a batch download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    /// Skipped tickers in input order.
    pub skipped_tickers: Vec<String>,
    /// The error that caused each skip.
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_downloaded(&self) -> bool {
        self.skipped == 0
    }
}
