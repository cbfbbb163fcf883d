//! Cost basis and market value math for lots and the whole portfolio.
use crate::core::lot::Lot;

pub fn lot_cost(lot: &Lot) -> f64 {
    lot.quantity * lot.unit_cost
}

pub fn lot_value(lot: &Lot) -> f64 {
    lot.quantity * lot.unit_current
}

/// Aggregate valuation of a set of lots, in local currency.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioValuation {
    pub cost: f64,
    pub value: f64,
    pub nominal_pnl: f64,
    /// `None` when the cost basis is zero; rendered as N/A, never divided.
    pub nominal_return_pct: Option<f64>,
}

pub fn value_portfolio(lots: &[Lot]) -> PortfolioValuation {
    let cost: f64 = lots.iter().map(lot_cost).sum();
    let value: f64 = lots.iter().map(lot_value).sum();
    let nominal_pnl = value - cost;
    let nominal_return_pct = if cost == 0.0 {
        None
    } else {
        Some(nominal_pnl / cost * 100.0)
    };
    PortfolioValuation {
        cost,
        value,
        nominal_pnl,
        nominal_return_pct,
    }
}

/// Nominal return of a single lot, `None` on a zero cost basis.
pub fn nominal_return_pct(lot: &Lot) -> Option<f64> {
    let cost = lot_cost(lot);
    if cost == 0.0 {
        return None;
    }
    Some((lot_value(lot) - cost) / cost * 100.0)
}
