//! Core business logic: ledger, rates, caching and analytics.

pub mod cache;
pub mod compose;
pub mod config;
pub mod ledger;
pub mod log;
pub mod lot;
pub mod rates;
pub mod real_return;
pub mod report;
pub mod snapshot;
pub mod valuation;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use ledger::Ledger;
pub use lot::{Lot, LotDraft, LotUpdate, SnapshotState};
pub use rates::{Benchmark, BenchmarkKind, RateSource};
