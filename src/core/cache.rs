//! TTL rate cache shielding the rate source from redundant calls.
use crate::core::rates::{Benchmark, BenchmarkKind, GRAMS_PER_TROY_OUNCE, RateSource};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Time source for expiry checks, pluggable so TTL behavior is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache key: ticker plus the requested date, `None` marking a live lookup.
type RateKey = (String, Option<NaiveDate>);

struct CachedRate {
    value: f64,
    fetched_at: Instant,
}

/// Read-through cache over a `RateSource`. Historical entries use a long TTL
/// (history never changes; the TTL only bounds memory), live entries a short
/// one. Failed lookups yield `None`, never a substitute rate; a live lookup
/// that fails after a previous success serves the stale value instead.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    entries: Mutex<HashMap<RateKey, CachedRate>>,
    historical_ttl: Duration,
    live_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl RateCache {
    pub fn new(source: Arc<dyn RateSource>, historical_ttl: Duration, live_ttl: Duration) -> Self {
        Self::with_clock(source, historical_ttl, live_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn RateSource>,
        historical_ttl: Duration,
        live_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
            historical_ttl,
            live_ttl,
            clock,
        }
    }

    /// Resolves a benchmark's rate at a historical date. Derived benchmarks
    /// compose two cached ticker lookups; the composed value itself is not
    /// cached. Inflation benchmarks have no market rate.
    pub async fn get_historical(&self, benchmark: &Benchmark, date: NaiveDate) -> Option<f64> {
        match &benchmark.kind {
            BenchmarkKind::Currency { ticker } => self.ticker_historical(ticker, date).await,
            BenchmarkKind::GoldGram {
                spot_ticker,
                fx_ticker,
            } => {
                let spot = self.ticker_historical(spot_ticker, date).await?;
                let fx = self.ticker_historical(fx_ticker, date).await?;
                Some(spot * fx / GRAMS_PER_TROY_OUNCE)
            }
            BenchmarkKind::Inflation { .. } => None,
        }
    }

    /// Resolves a benchmark's latest rate. Never panics; `None` only when a
    /// ticker has no fresh value, no stale value, and the source fails.
    pub async fn get_live(&self, benchmark: &Benchmark) -> Option<f64> {
        match &benchmark.kind {
            BenchmarkKind::Currency { ticker } => self.ticker_live(ticker).await,
            BenchmarkKind::GoldGram {
                spot_ticker,
                fx_ticker,
            } => {
                let spot = self.ticker_live(spot_ticker).await?;
                let fx = self.ticker_live(fx_ticker).await?;
                Some(spot * fx / GRAMS_PER_TROY_OUNCE)
            }
            BenchmarkKind::Inflation { .. } => None,
        }
    }

    async fn ticker_historical(&self, ticker: &str, date: NaiveDate) -> Option<f64> {
        let key = (ticker.to_string(), Some(date));
        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                if self.clock.now() < entry.fetched_at + self.historical_ttl {
                    debug!(ticker, %date, "Historical rate cache hit");
                    return Some(entry.value);
                }
            }
        }

        debug!(ticker, %date, "Historical rate cache miss");
        match self.source.historical(ticker, date).await {
            Ok(Some(value)) => {
                self.store(key, value).await;
                Some(value)
            }
            Ok(None) => {
                warn!(ticker, %date, "No historical rate available");
                None
            }
            Err(e) => {
                warn!(ticker, %date, error = %e, "Historical rate fetch failed");
                None
            }
        }
    }

    async fn ticker_live(&self, ticker: &str) -> Option<f64> {
        let key = (ticker.to_string(), None);
        let stale = {
            let entries = self.entries.lock().await;
            match entries.get(&key) {
                Some(entry) if self.clock.now() < entry.fetched_at + self.live_ttl => {
                    debug!(ticker, "Live rate cache hit");
                    return Some(entry.value);
                }
                Some(entry) => Some(entry.value),
                None => None,
            }
        };

        debug!(ticker, "Live rate cache miss");
        match self.source.live(ticker).await {
            Ok(value) => {
                self.store(key, value).await;
                Some(value)
            }
            Err(e) => {
                warn!(ticker, error = %e, "Live rate fetch failed, using last known value");
                stale
            }
        }
    }

    async fn store(&self, key: RateKey, value: f64) {
        let mut entries = self.entries.lock().await;
        // Duplicate concurrent fetches may race here; values for the same
        // key are deterministic, so last write wins.
        entries.insert(
            key,
            CachedRate {
                value,
                fetched_at: self.clock.now(),
            },
        );
    }
}
