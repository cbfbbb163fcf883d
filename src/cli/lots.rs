//! Ledger mutation commands: add, edit, remove and snapshot retry.
use super::ui;
use crate::core::snapshot::{SnapshotReport, refresh_lot_snapshot};
use crate::core::{Benchmark, Ledger, LotDraft, LotUpdate, RateCache};
use anyhow::Result;
use chrono::NaiveDate;

pub async fn add(
    ledger: &mut Ledger,
    cache: &RateCache,
    benchmarks: &[Benchmark],
    code: String,
    quantity: f64,
    unit_cost: f64,
    unit_current: Option<f64>,
    date: NaiveDate,
) -> Result<()> {
    let id = ledger.add(LotDraft {
        code,
        quantity,
        unit_cost,
        unit_current,
        acquisition_date: date,
    })?;

    let report = snapshot_with_progress(ledger, id, cache, benchmarks).await?;
    let lot = ledger.lot(id)?;
    println!("Added lot {} ({}).", id, lot.code);
    warn_if_incomplete(id, &report);
    Ok(())
}

pub async fn edit(
    ledger: &mut Ledger,
    cache: &RateCache,
    benchmarks: &[Benchmark],
    id: u64,
    update: LotUpdate,
) -> Result<()> {
    let date_changed = ledger.update(id, update)?;
    println!("Updated lot {id}.");

    // A date change invalidates the frozen snapshot; refetch before the
    // update is considered complete.
    if date_changed {
        let report = snapshot_with_progress(ledger, id, cache, benchmarks).await?;
        warn_if_incomplete(id, &report);
    }
    Ok(())
}

pub fn remove(ledger: &mut Ledger, id: u64) -> Result<()> {
    let lot = ledger.remove(id)?;
    println!("Removed lot {} ({}).", id, lot.code);
    Ok(())
}

/// Explicit retry for a lot whose snapshot fetch failed.
pub async fn retry_snapshot(
    ledger: &mut Ledger,
    cache: &RateCache,
    benchmarks: &[Benchmark],
    id: u64,
) -> Result<()> {
    let report = snapshot_with_progress(ledger, id, cache, benchmarks).await?;
    if report.is_complete() {
        println!("Snapshot for lot {id} is now complete.");
    } else {
        warn_if_incomplete(id, &report);
    }
    Ok(())
}

async fn snapshot_with_progress(
    ledger: &mut Ledger,
    id: u64,
    cache: &RateCache,
    benchmarks: &[Benchmark],
) -> Result<SnapshotReport> {
    let required = benchmarks.iter().filter(|b| b.needs_snapshot()).count();
    let pb = ui::new_progress_bar(required as u64, true);
    pb.set_message("Fetching acquisition rates...");
    let report = refresh_lot_snapshot(ledger, id, cache, benchmarks, &|| pb.inc(1)).await;
    pb.finish_and_clear();
    report
}

fn warn_if_incomplete(id: u64, report: &SnapshotReport) {
    if !report.is_complete() {
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "Warning: could not fetch acquisition rates for {} on lot {}. \
                     The lot is kept; those benchmarks will show N/A until \
                     `reel retry-snapshot {}` succeeds.",
                    report.missing.join(", "),
                    id,
                    id
                ),
                ui::StyleType::Warning
            )
        );
    }
}
