//! CloseLab Core — historical price retrieval, per-ticker CSV storage, and
//! derived views.
//!
//! The workflow is a sequence of fetch-then-write steps, each stage feeding
//! the next through the filesystem:
//! - EODHD client and provider abstraction (`data::eodhd`, `data::provider`)
//! - Exchange instrument listings (`data::exchange`)
//! - Per-ticker CSV store with metadata sidecars (`data::store`)
//! - Sequential batch downloads with per-ticker fault isolation (`data::download`)
//! - Typed date-indexed wide tables (`table`)
//! - Closing-price aggregation, log-returns, correlation, rebase (`analysis`)
//! - Report artifact export (`report`)
//!
//! Everything is blocking and single-threaded; the filesystem is the only
//! durable store and concurrent runs against one data directory are unsupported.

pub mod analysis;
pub mod data;
pub mod report;
pub mod table;
