//! EOD Historical Data (eodhistoricaldata.com) client.
//!
//! Two endpoints are consumed:
//! - `/api/eod/{TICKER}` — daily OHLCV history as a JSON array
//! - `/api/exchange-symbol-list/{EXCHANGE}` — tradable instruments for an exchange
//!
//! One blocking request per call, no retry: a transport fault fails the call
//! it occurred in and nothing else.

use super::exchange::Instrument;
use super::provider::{DataError, FetchResult, PriceBar, PriceProvider};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://eodhistoricaldata.com";

/// One row of the `/api/eod` JSON array.
#[derive(Debug, Deserialize)]
struct EodRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    adjusted_close: f64,
    volume: u64,
}

/// EODHD API client.
pub struct EodhdClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl EodhdClient {
    pub fn new(token: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at a different host (local fixture server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether a non-empty token was supplied.
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    fn eod_url(&self, ticker: &str, from: NaiveDate) -> String {
        format!(
            "{}/api/eod/{ticker}?api_token={}&from={from}&period=d&fmt=json",
            self.base_url, self.token
        )
    }

    fn exchange_url(&self, exchange: &str) -> String {
        format!(
            "{}/api/exchange-symbol-list/{exchange}?api_token={}&fmt=json",
            self.base_url, self.token
        )
    }

    /// List tradable instruments for an exchange.
    pub fn exchange_symbol_list(&self, exchange: &str) -> Result<Vec<Instrument>, DataError> {
        if !self.has_token() {
            return Err(DataError::MissingToken);
        }

        let url = self.exchange_url(exchange);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::ExchangeNotFound {
                exchange: exchange.to_string(),
            });
        }
        check_status(status, exchange)?;

        resp.json::<Vec<Instrument>>()
            .map_err(|e| DataError::MalformedResponse(format!("exchange list for {exchange}: {e}")))
    }
}

/// Map a non-2xx status to the error taxonomy shared by both endpoints.
fn check_status(status: reqwest::StatusCode, subject: &str) -> Result<(), DataError> {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(DataError::Authentication(format!(
            "HTTP {status} for {subject}"
        )));
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::RateLimited);
    }
    if !status.is_success() {
        return Err(DataError::Transport(format!("HTTP {status} for {subject}")));
    }
    Ok(())
}

impl PriceProvider for EodhdClient {
    fn name(&self) -> &str {
        "eodhd"
    }

    fn fetch(&self, ticker: &str, from: NaiveDate) -> Result<FetchResult, DataError> {
        if !self.has_token() {
            return Err(DataError::MissingToken);
        }

        let url = self.eod_url(ticker, from);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        check_status(status, ticker)?;

        let rows: Vec<EodRow> = resp
            .json()
            .map_err(|e| DataError::MalformedResponse(format!("eod history for {ticker}: {e}")))?;

        if rows.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }

        let mut bars: Vec<PriceBar> = rows
            .into_iter()
            .map(|r| PriceBar {
                date: r.date,
                open: r.open,
                high: r.high,
                low: r.low,
                close: r.close,
                adjusted_close: r.adjusted_close,
                volume: r.volume,
            })
            .collect();
        bars.sort_by_key(|b| b.date);

        Ok(FetchResult {
            ticker: ticker.to_string(),
            bars,
        })
    }
}
