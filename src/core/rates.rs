//! Benchmark definitions and the rate source abstraction.
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Grams per troy ounce, for converting metal spot quotes to gram prices.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.103_476_8;

/// How a benchmark's rate is derived. Market benchmarks resolve through a
/// `RateSource`; the inflation benchmark is a configured monthly compounding
/// rate and never touches the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BenchmarkKind {
    /// A single FX pair quoted in the local currency, e.g. `USDTRY=X`.
    Currency { ticker: String },
    /// A metal spot quote (per troy ounce, in a foreign currency) composed
    /// with an FX pair into a local-currency gram price.
    GoldGram {
        spot_ticker: String,
        fx_ticker: String,
    },
    /// Monthly compounding rate, e.g. 0.03 for 3% per month.
    Inflation { monthly_rate: f64 },
}

/// A reference asset the portfolio is measured against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmark {
    /// Short identifier used as the snapshot key and report column, e.g.
    /// "usd", "gold", "gbp", "inflation".
    pub id: String,
    /// Unit label for absolute (purchasing-power) deltas, e.g. "$", "gr".
    pub unit: String,
    #[serde(flatten)]
    pub kind: BenchmarkKind,
}

impl Benchmark {
    /// Market benchmarks need an acquisition snapshot; inflation does not
    /// (its baseline is the lot's cost basis).
    pub fn needs_snapshot(&self) -> bool {
        !matches!(self.kind, BenchmarkKind::Inflation { .. })
    }
}

/// Upstream quote provider. Implementations tolerate non-trading days by
/// scanning a short window after the requested date, and must bound their
/// network timeouts.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Close of the first trading day at or after `date`. `Ok(None)` means
    /// the source answered but had no usable data for that window.
    async fn historical(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>>;

    /// Latest available price for the ticker.
    async fn live(&self, ticker: &str) -> Result<f64>;
}
