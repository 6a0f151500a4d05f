//! Data retrieval and storage

pub mod download;
pub mod eodhd;
pub mod exchange;
pub mod provider;
pub mod store;
pub mod universe;

pub use download::{download_tickers, DownloadSummary};
pub use eodhd::EodhdClient;
pub use exchange::{filter_by_kind, list_exchange, Instrument, COMMON_STOCK, DEFAULT_EXCHANGE};
pub use provider::{
    DataError, DownloadProgress, FetchResult, PriceBar, PriceProvider, SilentProgress,
    StdoutProgress,
};
pub use store::{CsvStore, StoreMeta, StoreStatus};
pub use universe::{SpMember, SpUniverse};
