//! Ordered collection of lots with stable ids and flat-file exchange.
use crate::core::lot::{Lot, LotDraft, LotUpdate, SnapshotState, normalize_code};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// The ledger owns every lot plus the id counter. Insertion order is the only
/// ordering; codes may repeat across lots.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    lots: Vec<Lot>,
    next_id: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends a new lot, returning its id. The ledger is
    /// unchanged when validation fails. The returned lot starts `Pending`;
    /// the caller runs the snapshot fetch before reporting completion.
    pub fn add(&mut self, draft: LotDraft) -> Result<u64> {
        let id = self.next_id + 1;
        let lot = draft.into_lot(id)?;
        self.next_id = id;
        debug!(id, code = %lot.code, "Added lot");
        self.lots.push(lot);
        Ok(id)
    }

    /// Applies a partial update to the lot with the given id. Returns true
    /// when the acquisition date changed, in which case the caller must
    /// refetch the benchmark snapshot before the update is complete.
    pub fn update(&mut self, id: u64, update: LotUpdate) -> Result<bool> {
        // Validate everything before touching the lot.
        if let Some(q) = update.quantity {
            if q <= 0.0 || !q.is_finite() {
                bail!("Quantity must be a positive number, got {q}");
            }
        }
        for (label, price) in [
            ("Unit cost", update.unit_cost),
            ("Current price", update.unit_current),
        ] {
            if let Some(p) = price {
                if p < 0.0 || !p.is_finite() {
                    bail!("{label} must be non-negative, got {p}");
                }
            }
        }

        let lot = self.lot_mut(id)?;
        if let Some(q) = update.quantity {
            lot.quantity = q;
        }
        if let Some(c) = update.unit_cost {
            lot.unit_cost = c;
        }
        if let Some(p) = update.unit_current {
            lot.unit_current = p;
        }
        let mut date_changed = false;
        if let Some(date) = update.acquisition_date {
            if date != lot.acquisition_date {
                lot.acquisition_date = date;
                lot.benchmark_snapshot.clear();
                lot.snapshot_state = SnapshotState::Pending;
                date_changed = true;
            }
        }
        debug!(id, date_changed, "Updated lot");
        Ok(date_changed)
    }

    /// Removes a lot by its stable id. Position in the ledger is irrelevant,
    /// so remaining lots keep their ids and order.
    pub fn remove(&mut self, id: u64) -> Result<Lot> {
        let index = self
            .lots
            .iter()
            .position(|lot| lot.id == id)
            .with_context(|| format!("No lot with id {id}"))?;
        debug!(id, "Removed lot");
        Ok(self.lots.remove(index))
    }

    /// Atomic bulk substitution, used by import. Resets the id counter past
    /// the highest imported id so new lots never collide.
    pub fn replace_all(&mut self, lots: Vec<Lot>) {
        self.next_id = lots.iter().map(|lot| lot.id).max().unwrap_or(0);
        self.lots = lots;
        debug!(count = self.lots.len(), "Replaced ledger contents");
    }

    pub fn export_all(&self) -> &[Lot] {
        &self.lots
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn lot(&self, id: u64) -> Result<&Lot> {
        self.lots
            .iter()
            .find(|lot| lot.id == id)
            .with_context(|| format!("No lot with id {id}"))
    }

    pub fn lot_mut(&mut self, id: u64) -> Result<&mut Lot> {
        self.lots
            .iter_mut()
            .find(|lot| lot.id == id)
            .with_context(|| format!("No lot with id {id}"))
    }

    /// Overwrites the frozen snapshot fields after a fetch pass.
    pub fn record_snapshot(
        &mut self,
        id: u64,
        snapshot: std::collections::BTreeMap<String, f64>,
        state: SnapshotState,
    ) -> Result<()> {
        let lot = self.lot_mut(id)?;
        lot.benchmark_snapshot = snapshot;
        lot.snapshot_state = state;
        Ok(())
    }

    /// Bulk-overwrites `unit_current` from `(code, price)` pairs. Codes
    /// without a lot are ignored; lots without a matching code are left
    /// untouched. Returns the number of lots updated.
    pub fn apply_prices(&mut self, prices: &[(String, f64)]) -> Result<usize> {
        let mut normalized = Vec::with_capacity(prices.len());
        for (code, price) in prices {
            if *price < 0.0 || !price.is_finite() {
                bail!("Price for {code} must be non-negative, got {price}");
            }
            normalized.push((normalize_code(code)?, *price));
        }

        let mut updated = 0;
        for lot in &mut self.lots {
            if let Some((_, price)) = normalized.iter().find(|(code, _)| *code == lot.code) {
                lot.unit_current = *price;
                updated += 1;
            }
        }
        debug!(updated, "Applied price list");
        Ok(updated)
    }

    /// Loads a ledger file; a missing file yields an empty ledger.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No ledger file, starting empty");
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger file: {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse ledger file: {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write ledger file: {}", path.display()))
    }

    /// Parses a full ledger from JSON. Any malformed record rejects the
    /// whole payload; the caller's ledger is replaced only on success.
    /// The id counter is re-derived from the lot ids rather than trusted,
    /// so a hand-edited file can never make `add` mint a colliding id.
    pub fn from_json(contents: &str) -> Result<Self> {
        let mut ledger: Ledger = serde_json::from_str(contents).context("Malformed ledger payload")?;
        let mut seen = std::collections::HashSet::new();
        for lot in &ledger.lots {
            if !seen.insert(lot.id) {
                bail!("Malformed ledger payload: duplicate lot id {}", lot.id);
            }
            if lot.code.trim().is_empty() {
                bail!("Malformed ledger payload: lot {} has an empty code", lot.id);
            }
            if lot.quantity <= 0.0 {
                bail!(
                    "Malformed ledger payload: lot {} has non-positive quantity {}",
                    lot.id,
                    lot.quantity
                );
            }
        }
        ledger.next_id = ledger.lots.iter().map(|lot| lot.id).max().unwrap_or(0);
        Ok(ledger)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize ledger")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(code: &str) -> LotDraft {
        LotDraft {
            code: code.to_string(),
            quantity: 100.0,
            unit_cost: 12.5,
            unit_current: None,
            acquisition_date: date(2024, 1, 15),
        }
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.add(draft("AFT")).unwrap(), 1);
        assert_eq!(ledger.add(draft("TCD")).unwrap(), 2);
        assert_eq!(ledger.lots().len(), 2);
    }

    #[test]
    fn test_add_rejects_invalid_draft_without_mutation() {
        let mut ledger = Ledger::new();
        ledger.add(draft("AFT")).unwrap();
        let mut bad = draft("TCD");
        bad.quantity = -1.0;
        assert!(ledger.add(bad).is_err());
        assert_eq!(ledger.lots().len(), 1);
        // Next successful add still gets a fresh id.
        assert_eq!(ledger.add(draft("TCD")).unwrap(), 2);
    }

    #[test]
    fn test_remove_by_id_not_position() {
        let mut ledger = Ledger::new();
        let a = ledger.add(draft("AFT")).unwrap();
        let b = ledger.add(draft("TCD")).unwrap();
        let c = ledger.add(draft("YAS")).unwrap();

        // Removing the first lot must not shift identity of the others.
        ledger.remove(a).unwrap();
        assert_eq!(ledger.lot(b).unwrap().code, "TCD");
        assert_eq!(ledger.lot(c).unwrap().code, "YAS");
        assert!(ledger.remove(a).is_err());
    }

    #[test]
    fn test_update_partial_fields() {
        let mut ledger = Ledger::new();
        let id = ledger.add(draft("AFT")).unwrap();
        let changed = ledger
            .update(
                id,
                LotUpdate {
                    unit_current: Some(14.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!changed);
        let lot = ledger.lot(id).unwrap();
        assert_eq!(lot.unit_current, 14.0);
        assert_eq!(lot.quantity, 100.0);
    }

    #[test]
    fn test_update_date_change_resets_snapshot() {
        let mut ledger = Ledger::new();
        let id = ledger.add(draft("AFT")).unwrap();
        ledger
            .record_snapshot(
                id,
                [("usd".to_string(), 30.0)].into_iter().collect(),
                SnapshotState::Ok,
            )
            .unwrap();

        let changed = ledger
            .update(
                id,
                LotUpdate {
                    acquisition_date: Some(date(2024, 3, 1)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(changed);
        let lot = ledger.lot(id).unwrap();
        assert!(lot.benchmark_snapshot.is_empty());
        assert_eq!(lot.snapshot_state, SnapshotState::Pending);
    }

    #[test]
    fn test_update_same_date_keeps_snapshot() {
        let mut ledger = Ledger::new();
        let id = ledger.add(draft("AFT")).unwrap();
        ledger
            .record_snapshot(
                id,
                [("usd".to_string(), 30.0)].into_iter().collect(),
                SnapshotState::Ok,
            )
            .unwrap();
        let changed = ledger
            .update(
                id,
                LotUpdate {
                    acquisition_date: Some(date(2024, 1, 15)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!changed);
        assert_eq!(ledger.lot(id).unwrap().snapshot_state, SnapshotState::Ok);
    }

    #[test]
    fn test_update_rejects_invalid_input_without_mutation() {
        let mut ledger = Ledger::new();
        let id = ledger.add(draft("AFT")).unwrap();
        let err = ledger
            .update(
                id,
                LotUpdate {
                    quantity: Some(0.0),
                    unit_current: Some(99.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("positive"));
        // Partial application must not have happened.
        assert_eq!(ledger.lot(id).unwrap().unit_current, 12.5);
    }

    #[test]
    fn test_replace_all_resets_id_counter() {
        let mut ledger = Ledger::new();
        ledger.add(draft("AFT")).unwrap();

        let mut incoming = Ledger::new();
        for code in ["TCD", "YAS"] {
            incoming.add(draft(code)).unwrap();
        }
        ledger.replace_all(incoming.lots.clone());
        assert_eq!(ledger.lots().len(), 2);
        assert_eq!(ledger.lots()[0].code, "TCD");
        // New ids continue past the imported maximum.
        assert_eq!(ledger.add(draft("NNF")).unwrap(), 3);
    }

    #[test]
    fn test_json_round_trip_preserves_dates_and_precision() {
        let mut ledger = Ledger::new();
        let mut d = draft("AFT");
        d.quantity = 123.456789;
        d.unit_cost = 0.000001;
        let id = ledger.add(d).unwrap();
        ledger
            .record_snapshot(
                id,
                [("usd".to_string(), 32.512345), ("gold".to_string(), 2650.75)]
                    .into_iter()
                    .collect(),
                SnapshotState::Ok,
            )
            .unwrap();

        let json = ledger.to_json().unwrap();
        let restored = Ledger::from_json(&json).unwrap();
        let lot = &restored.lots()[0];
        assert_eq!(lot.acquisition_date, date(2024, 1, 15));
        assert_eq!(lot.quantity, 123.456789);
        assert_eq!(lot.unit_cost, 0.000001);
        assert_eq!(lot.benchmark_snapshot["usd"], 32.512345);
        assert_eq!(restored.next_id, ledger.next_id);
    }

    #[test]
    fn test_malformed_import_is_rejected_wholesale() {
        assert!(Ledger::from_json("not json").is_err());
        // Structurally valid JSON with an invalid lot is rejected too.
        let payload = r#"{
            "lots": [{
                "id": 1, "code": "AFT", "quantity": -3.0,
                "unit_cost": 1.0, "unit_current": 1.0,
                "acquisition_date": "2024-01-15",
                "benchmark_snapshot": {}, "snapshot_state": "ok"
            }],
            "next_id": 1
        }"#;
        assert!(Ledger::from_json(payload).is_err());
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let payload = r#"{
            "lots": [{
                "id": 1, "code": "AFT", "quantity": 10.0,
                "unit_cost": 1.0, "unit_current": 1.0,
                "acquisition_date": "2024-01-15",
                "benchmark_snapshot": {}, "snapshot_state": "ok"
            }, {
                "id": 1, "code": "TCD", "quantity": 5.0,
                "unit_cost": 2.0, "unit_current": 2.0,
                "acquisition_date": "2024-02-01",
                "benchmark_snapshot": {}, "snapshot_state": "ok"
            }],
            "next_id": 2
        }"#;
        let err = Ledger::from_json(payload).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_import_rederives_understated_id_counter() {
        // A hand-edited file may carry a counter below the highest lot id.
        let payload = r#"{
            "lots": [{
                "id": 7, "code": "AFT", "quantity": 10.0,
                "unit_cost": 1.0, "unit_current": 1.0,
                "acquisition_date": "2024-01-15",
                "benchmark_snapshot": {}, "snapshot_state": "ok"
            }],
            "next_id": 1
        }"#;
        let mut ledger = Ledger::from_json(payload).unwrap();
        assert_eq!(ledger.add(draft("TCD")).unwrap(), 8);
    }

    #[test]
    fn test_apply_prices_updates_matching_codes_only() {
        let mut ledger = Ledger::new();
        let a = ledger.add(draft("AFT")).unwrap();
        let b = ledger.add(draft("TCD")).unwrap();
        let c = ledger.add(draft("AFT")).unwrap();

        let updated = ledger
            .apply_prices(&[("aft".to_string(), 15.5), ("ZZZ".to_string(), 9.0)])
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(ledger.lot(a).unwrap().unit_current, 15.5);
        assert_eq!(ledger.lot(c).unwrap().unit_current, 15.5);
        assert_eq!(ledger.lot(b).unwrap().unit_current, 12.5);
    }

    #[test]
    fn test_apply_prices_rejects_negative_price() {
        let mut ledger = Ledger::new();
        ledger.add(draft("AFT")).unwrap();
        assert!(ledger.apply_prices(&[("AFT".to_string(), -1.0)]).is_err());
        assert_eq!(ledger.lots()[0].unit_current, 12.5);
    }
}
