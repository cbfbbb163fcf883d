//! Assembles the full analytics report consumed by the rendering layer.
//!
//! Live rates are fetched once up front; assembly itself is pure. Every
//! field in the result is either a number or `None` (rendered N/A), so no
//! rate failure ever aborts the rest of the report.
use crate::core::cache::RateCache;
use crate::core::compose::{AssetExposure, CompositionTable, decompose};
use crate::core::lot::{Lot, SnapshotState};
use crate::core::rates::{Benchmark, BenchmarkKind};
use crate::core::real_return::{
    BenchmarkAggregate, BenchmarkPerformance, aggregate_performance, benchmark_performance,
    inflation_adjusted_delta,
};
use crate::core::valuation::{
    PortfolioValuation, lot_cost, lot_value, nominal_return_pct, value_portfolio,
};
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::BTreeMap;

/// One report row per lot.
#[derive(Debug, Clone)]
pub struct LotRow {
    pub id: u64,
    pub code: String,
    pub quantity: f64,
    pub cost: f64,
    pub value: f64,
    pub nominal_pnl: f64,
    pub nominal_return_pct: Option<f64>,
    /// Keyed by benchmark id, market benchmarks only.
    pub benchmarks: BTreeMap<String, BenchmarkPerformance>,
    pub inflation_delta: Option<f64>,
    pub snapshot_state: SnapshotState,
}

#[derive(Debug)]
pub struct PortfolioReport {
    pub rows: Vec<LotRow>,
    pub totals: PortfolioValuation,
    pub benchmark_totals: BTreeMap<String, BenchmarkAggregate>,
    pub inflation_total: Option<f64>,
    pub decomposition: Vec<AssetExposure>,
}

/// Fetches live rates for every market benchmark, then assembles the report.
/// Progress updates can be reported via `update_callback`, invoked once per
/// completed fetch.
pub async fn build_report(
    lots: &[Lot],
    benchmarks: &[Benchmark],
    cache: &RateCache,
    table: &CompositionTable,
    today: NaiveDate,
    update_callback: &(dyn Fn()),
) -> PortfolioReport {
    let market: Vec<&Benchmark> = benchmarks.iter().filter(|b| b.needs_snapshot()).collect();
    let fetches = market.iter().map(|benchmark| async move {
        let rate = cache.get_live(benchmark).await;
        update_callback();
        (benchmark.id.clone(), rate)
    });
    let live_rates: BTreeMap<String, Option<f64>> = join_all(fetches).await.into_iter().collect();

    assemble_report(lots, benchmarks, &live_rates, table, today)
}

/// Pure assembly from pre-fetched live rates.
pub fn assemble_report(
    lots: &[Lot],
    benchmarks: &[Benchmark],
    live_rates: &BTreeMap<String, Option<f64>>,
    table: &CompositionTable,
    today: NaiveDate,
) -> PortfolioReport {
    let monthly_inflation = benchmarks.iter().find_map(|b| match b.kind {
        BenchmarkKind::Inflation { monthly_rate } => Some(monthly_rate),
        _ => None,
    });

    let rows = lots
        .iter()
        .map(|lot| {
            let mut results = BTreeMap::new();
            for benchmark in benchmarks.iter().filter(|b| b.needs_snapshot()) {
                let r_then = lot.benchmark_snapshot.get(&benchmark.id).copied();
                let r_now = live_rates.get(&benchmark.id).copied().flatten();
                results.insert(
                    benchmark.id.clone(),
                    benchmark_performance(lot, r_then, r_now),
                );
            }
            LotRow {
                id: lot.id,
                code: lot.code.clone(),
                quantity: lot.quantity,
                cost: lot_cost(lot),
                value: lot_value(lot),
                nominal_pnl: lot_value(lot) - lot_cost(lot),
                nominal_return_pct: nominal_return_pct(lot),
                benchmarks: results,
                inflation_delta: monthly_inflation
                    .map(|rate| inflation_adjusted_delta(lot, rate, today)),
                snapshot_state: lot.snapshot_state,
            }
        })
        .collect();

    let mut benchmark_totals = BTreeMap::new();
    for benchmark in benchmarks.iter().filter(|b| b.needs_snapshot()) {
        let rates_then: Vec<Option<f64>> = lots
            .iter()
            .map(|lot| lot.benchmark_snapshot.get(&benchmark.id).copied())
            .collect();
        let r_now = live_rates.get(&benchmark.id).copied().flatten();
        benchmark_totals.insert(
            benchmark.id.clone(),
            aggregate_performance(lots, &rates_then, r_now),
        );
    }

    let inflation_total = monthly_inflation.map(|rate| {
        lots.iter()
            .map(|lot| inflation_adjusted_delta(lot, rate, today))
            .sum()
    });

    PortfolioReport {
        rows,
        totals: value_portfolio(lots),
        benchmark_totals,
        inflation_total,
        decomposition: decompose(lots, table),
    }
}
