//! Lot data model: one recorded purchase of an instrument.
use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of the acquisition-rate snapshot for a lot.
///
/// `Pending` exists only between a mutation and the snapshot fetch; a
/// persisted lot is `Ok` or `Failed`. A `Failed` lot stays failed until the
/// user retries explicitly or resubmits a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotState {
    Pending,
    Ok,
    Failed,
}

/// One purchase event. `id` is assigned by the ledger and stable for the
/// lifetime of the ledger file; list position carries no identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: u64,
    pub code: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub unit_current: f64,
    pub acquisition_date: NaiveDate,
    #[serde(default)]
    pub benchmark_snapshot: BTreeMap<String, f64>,
    pub snapshot_state: SnapshotState,
}

/// User-supplied fields for a new lot, before validation and id assignment.
#[derive(Debug, Clone)]
pub struct LotDraft {
    pub code: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub unit_current: Option<f64>,
    pub acquisition_date: NaiveDate,
}

impl LotDraft {
    /// Validates and normalizes the draft into a lot with the given id.
    /// The snapshot starts `Pending`; the caller fetches it before the add
    /// is reported complete.
    pub fn into_lot(self, id: u64) -> Result<Lot> {
        let code = normalize_code(&self.code)?;
        if self.quantity <= 0.0 || !self.quantity.is_finite() {
            bail!("Quantity must be a positive number, got {}", self.quantity);
        }
        if self.unit_cost < 0.0 || !self.unit_cost.is_finite() {
            bail!("Unit cost must be non-negative, got {}", self.unit_cost);
        }
        let unit_current = match self.unit_current {
            Some(p) if p < 0.0 || !p.is_finite() => {
                bail!("Current price must be non-negative, got {p}")
            }
            Some(p) => p,
            None => self.unit_cost,
        };
        Ok(Lot {
            id,
            code,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            unit_current,
            acquisition_date: self.acquisition_date,
            benchmark_snapshot: BTreeMap::new(),
            snapshot_state: SnapshotState::Pending,
        })
    }
}

/// Partial update for an existing lot. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct LotUpdate {
    pub quantity: Option<f64>,
    pub unit_cost: Option<f64>,
    pub unit_current: Option<f64>,
    pub acquisition_date: Option<NaiveDate>,
}

pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        bail!("Instrument code must not be empty");
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(code: &str, quantity: f64, unit_cost: f64) -> LotDraft {
        LotDraft {
            code: code.to_string(),
            quantity,
            unit_cost,
            unit_current: None,
            acquisition_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_draft_normalizes_code_and_defaults_current_price() {
        let lot = draft(" aft ", 100.0, 12.5).into_lot(1).unwrap();
        assert_eq!(lot.id, 1);
        assert_eq!(lot.code, "AFT");
        assert_eq!(lot.unit_current, 12.5);
        assert_eq!(lot.snapshot_state, SnapshotState::Pending);
        assert!(lot.benchmark_snapshot.is_empty());
    }

    #[test]
    fn test_draft_rejects_empty_code() {
        let err = draft("  ", 1.0, 1.0).into_lot(1).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_draft_rejects_non_positive_quantity() {
        assert!(draft("AFT", 0.0, 1.0).into_lot(1).is_err());
        assert!(draft("AFT", -5.0, 1.0).into_lot(1).is_err());
        assert!(draft("AFT", f64::NAN, 1.0).into_lot(1).is_err());
    }

    #[test]
    fn test_draft_rejects_negative_prices() {
        assert!(draft("AFT", 1.0, -0.5).into_lot(1).is_err());
        let mut d = draft("AFT", 1.0, 1.0);
        d.unit_current = Some(-2.0);
        assert!(d.into_lot(1).is_err());
    }

    #[test]
    fn test_explicit_current_price_is_kept() {
        let mut d = draft("AFT", 100.0, 10.0);
        d.unit_current = Some(12.0);
        let lot = d.into_lot(7).unwrap();
        assert_eq!(lot.unit_current, 12.0);
    }
}
