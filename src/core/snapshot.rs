//! Acquisition-time benchmark snapshot fetching for lots.
use crate::core::cache::RateCache;
use crate::core::ledger::Ledger;
use crate::core::lot::SnapshotState;
use crate::core::rates::Benchmark;
use anyhow::Result;
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of a snapshot pass for one lot. `missing` lists benchmark ids
/// whose rate could not be fetched; the lot is kept either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotReport {
    pub state: SnapshotState,
    pub missing: Vec<String>,
}

impl SnapshotReport {
    pub fn is_complete(&self) -> bool {
        self.state == SnapshotState::Ok
    }
}

/// Fetches the historical rate of every snapshot-bearing benchmark at the
/// given date, concurrently, invoking `update_callback` once per completed
/// fetch. Partial results are kept so a later retry only has to fill the
/// gaps (the cache absorbs the repeats anyway).
pub async fn fetch_snapshot(
    cache: &RateCache,
    benchmarks: &[Benchmark],
    date: NaiveDate,
    update_callback: &(dyn Fn()),
) -> (BTreeMap<String, f64>, SnapshotReport) {
    let required: Vec<&Benchmark> = benchmarks.iter().filter(|b| b.needs_snapshot()).collect();
    let fetches = required.iter().map(|benchmark| async move {
        let rate = cache.get_historical(benchmark, date).await;
        update_callback();
        (benchmark.id.clone(), rate)
    });

    let mut snapshot = BTreeMap::new();
    let mut missing = Vec::new();
    for (id, rate) in join_all(fetches).await {
        match rate {
            Some(rate) => {
                snapshot.insert(id, rate);
            }
            None => {
                warn!(benchmark = %id, %date, "Snapshot rate unavailable");
                missing.push(id);
            }
        }
    }

    let state = if missing.is_empty() {
        SnapshotState::Ok
    } else {
        SnapshotState::Failed
    };
    (snapshot, SnapshotReport { state, missing })
}

/// Runs a snapshot pass for one ledger lot and records the outcome. Used on
/// add, on an acquisition-date change, and on an explicit retry.
pub async fn refresh_lot_snapshot(
    ledger: &mut Ledger,
    id: u64,
    cache: &RateCache,
    benchmarks: &[Benchmark],
    update_callback: &(dyn Fn()),
) -> Result<SnapshotReport> {
    let date = ledger.lot(id)?.acquisition_date;
    let (snapshot, report) = fetch_snapshot(cache, benchmarks, date, update_callback).await;
    debug!(id, state = ?report.state, "Recorded snapshot");
    ledger.record_snapshot(id, snapshot, report.state)?;
    Ok(report)
}
