//! Derived views over stored price data: aggregation, returns, correlation,
//! and chart-support transforms.

pub mod closes;
pub mod corr;
pub mod rebase;
pub mod returns;

pub use closes::{aggregate_closes, PriceField, AGGREGATE_FILENAME, AGGREGATE_PREFIX};
pub use corr::{correlation, CorrelationMatrix};
pub use rebase::{pct_from_first, rebase_to_first};
pub use returns::{log_returns, pct_change, returns_from_closes};
