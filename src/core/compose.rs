//! Look-through decomposition of lots into underlying asset exposure.
use crate::core::lot::Lot;
use crate::core::valuation::lot_value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Static look-through table: instrument code to weighted underlying assets.
/// Ships as configuration data so it can be revised without a redeploy; the
/// version travels with the config for traceability. Weights need not sum
/// to 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionTable {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub codes: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CompositionTable {
    /// Constituents of a code. Unknown codes degrade to a synthetic
    /// single-asset entry of weight 1 under the code itself.
    pub fn lookup(&self, code: &str) -> BTreeMap<String, f64> {
        match self.codes.get(code) {
            Some(entry) => entry.clone(),
            None => {
                debug!(code, "No composition entry, using identity fallback");
                BTreeMap::from([(code.to_string(), 1.0)])
            }
        }
    }
}

/// One row of the exposure report.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetExposure {
    pub asset: String,
    pub value: f64,
    /// Share of the grand total; 0 when the grand total is 0.
    pub percentage: f64,
}

/// Accrues `weight * lot_value` per underlying asset across all lots,
/// summing when different codes share an asset, and reports descending by
/// value.
pub fn decompose(lots: &[Lot], table: &CompositionTable) -> Vec<AssetExposure> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for lot in lots {
        let value = lot_value(lot);
        for (asset, weight) in table.lookup(&lot.code) {
            *totals.entry(asset).or_insert(0.0) += weight * value;
        }
    }

    let grand_total: f64 = totals.values().sum();
    let mut report: Vec<AssetExposure> = totals
        .into_iter()
        .map(|(asset, value)| AssetExposure {
            asset,
            value,
            percentage: if grand_total == 0.0 {
                0.0
            } else {
                value / grand_total * 100.0
            },
        })
        .collect();
    report.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.asset.cmp(&b.asset))
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lot::LotDraft;
    use chrono::NaiveDate;

    fn lot(code: &str, quantity: f64, unit_current: f64) -> Lot {
        LotDraft {
            code: code.to_string(),
            quantity,
            unit_cost: unit_current,
            unit_current: Some(unit_current),
            acquisition_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
        .into_lot(1)
        .unwrap()
    }

    fn table() -> CompositionTable {
        serde_yaml::from_str(
            r#"
version: 3
codes:
  AFT:
    Equity: 0.9
    Cash: 0.1
  NNF:
    Equity: 0.4
    Bonds: 0.6
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_code_identity_fallback() {
        let lots = vec![lot("XYZ", 1.0, 500.0)];
        let report = decompose(&lots, &table());
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].asset, "XYZ");
        assert_eq!(report[0].value, 500.0);
        assert_eq!(report[0].percentage, 100.0);
    }

    #[test]
    fn test_shared_assets_sum_across_codes() {
        // AFT worth 1000, NNF worth 500; Equity = 0.9*1000 + 0.4*500.
        let lots = vec![lot("AFT", 100.0, 10.0), lot("NNF", 50.0, 10.0)];
        let report = decompose(&lots, &table());

        let equity = report.iter().find(|r| r.asset == "Equity").unwrap();
        assert!((equity.value - 1100.0).abs() < 1e-9);
        let bonds = report.iter().find(|r| r.asset == "Bonds").unwrap();
        assert!((bonds.value - 300.0).abs() < 1e-9);
        let cash = report.iter().find(|r| r.asset == "Cash").unwrap();
        assert!((cash.value - 100.0).abs() < 1e-9);

        // Sorted descending by value.
        assert_eq!(report[0].asset, "Equity");
        // Percentages normalize to ~100.
        let pct_sum: f64 = report.iter().map(|r| r.percentage).sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_reports_zero_percentages() {
        let lots = vec![lot("AFT", 5.0, 0.0)];
        let report = decompose(&lots, &table());
        assert!(report.iter().all(|r| r.percentage == 0.0));
        assert!(report.iter().all(|r| r.value == 0.0));
    }

    #[test]
    fn test_empty_ledger_empty_report() {
        assert!(decompose(&[], &table()).is_empty());
    }
}
