//! Real-return math: lot performance measured in units of a benchmark.
use crate::core::lot::Lot;
use crate::core::valuation::{lot_cost, lot_value};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Performance of one lot against one benchmark. Both forms are first-class:
/// `pct` is the relative form, `delta` the absolute purchasing-power form in
/// benchmark units. Both are `None` when either the acquisition rate or the
/// live rate is missing or zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkPerformance {
    pub pct: Option<f64>,
    pub delta: Option<f64>,
}

impl BenchmarkPerformance {
    pub const UNAVAILABLE: Self = Self {
        pct: None,
        delta: None,
    };

    pub fn is_available(&self) -> bool {
        self.delta.is_some()
    }
}

/// Computes a lot's performance against a benchmark from its frozen
/// acquisition rate and the live rate. Missing or zero rates degrade to
/// `UNAVAILABLE`; they are never treated as 1.0 or divided through.
pub fn benchmark_performance(
    lot: &Lot,
    r_then: Option<f64>,
    r_now: Option<f64>,
) -> BenchmarkPerformance {
    let (Some(r_then), Some(r_now)) = (r_then, r_now) else {
        return BenchmarkPerformance::UNAVAILABLE;
    };
    if r_then == 0.0 || r_now == 0.0 {
        debug!(lot = lot.id, "Zero benchmark rate, result unavailable");
        return BenchmarkPerformance::UNAVAILABLE;
    }

    let u_then = lot_cost(lot) / r_then;
    let u_now = lot_value(lot) / r_now;
    if u_then == 0.0 {
        // Zero cost basis: no acquisition-time benchmark units to compare.
        return BenchmarkPerformance {
            pct: None,
            delta: Some(u_now),
        };
    }
    BenchmarkPerformance {
        pct: Some((u_now / u_then - 1.0) * 100.0),
        delta: Some(u_now - u_then),
    }
}

/// Portfolio-level performance against one benchmark. Lots whose rates are
/// unavailable are excluded; `lots_included` says how many remain. A
/// zero-cost lot contributes its current units to the delta, so the pct
/// form can be `None` while the delta is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkAggregate {
    pub performance: BenchmarkPerformance,
    pub lots_included: usize,
}

/// Aggregates per-lot benchmark results by summing benchmark units over the
/// available lots only. With no available lot the aggregate is unavailable,
/// never zero.
pub fn aggregate_performance(
    lots: &[Lot],
    rates_then: &[Option<f64>],
    r_now: Option<f64>,
) -> BenchmarkAggregate {
    let mut u_then_total = 0.0;
    let mut u_now_total = 0.0;
    let mut included = 0;

    for (lot, r_then) in lots.iter().zip(rates_then) {
        let perf = benchmark_performance(lot, *r_then, r_now);
        if !perf.is_available() {
            continue;
        }
        // Safe: availability implies both rates are non-zero.
        u_then_total += lot_cost(lot) / r_then.unwrap();
        u_now_total += lot_value(lot) / r_now.unwrap();
        included += 1;
    }

    if included == 0 {
        return BenchmarkAggregate {
            performance: BenchmarkPerformance::UNAVAILABLE,
            lots_included: 0,
        };
    }
    if u_then_total == 0.0 {
        // Whole portfolio acquired at zero cost: same degradation as the
        // per-lot form.
        return BenchmarkAggregate {
            performance: BenchmarkPerformance {
                pct: None,
                delta: Some(u_now_total),
            },
            lots_included: included,
        };
    }
    BenchmarkAggregate {
        performance: BenchmarkPerformance {
            pct: Some((u_now_total / u_then_total - 1.0) * 100.0),
            delta: Some(u_now_total - u_then_total),
        },
        lots_included: included,
    }
}

/// Whole calendar months between two dates, floored at zero. A month counts
/// only once the day-of-month has been reached.
pub fn months_elapsed(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months =
        (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32);
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Value gained or lost after discounting the cost basis by the configured
/// monthly inflation rate compounded over the holding period.
pub fn inflation_adjusted_delta(lot: &Lot, monthly_rate: f64, today: NaiveDate) -> f64 {
    let months = months_elapsed(lot.acquisition_date, today);
    let factor = (1.0 + monthly_rate).powi(months as i32);
    lot_value(lot) - lot_cost(lot) * factor
}
