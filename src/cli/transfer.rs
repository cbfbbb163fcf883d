//! Flat-file exchange: ledger import/export and CSV price ingestion.
use super::ui;
use crate::core::Ledger;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Replaces the ledger with the contents of an exported file. The import is
/// all-or-nothing: a malformed payload leaves the current ledger untouched.
pub fn import(ledger: &mut Ledger, file: &Path) -> Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let incoming = Ledger::from_json(&contents)
        .with_context(|| format!("Import rejected: {}", file.display()))?;
    let count = incoming.lots().len();
    ledger.replace_all(incoming.export_all().to_vec());
    println!("Imported {count} lot(s) from {}.", file.display());
    Ok(())
}

pub fn export(ledger: &Ledger, file: &Path) -> Result<()> {
    fs::write(file, ledger.to_json()?)
        .with_context(|| format!("Failed to write export file: {}", file.display()))?;
    println!(
        "Exported {} lot(s) to {}.",
        ledger.export_all().len(),
        file.display()
    );
    Ok(())
}

/// Bulk-updates current unit prices from a two-column `code,price` CSV.
/// Codes without a lot in the ledger are reported and skipped.
pub fn prices(ledger: &mut Ledger, file: &Path) -> Result<()> {
    let pairs = read_price_list(file)?;
    let codes: Vec<String> = pairs.iter().map(|(code, _)| code.clone()).collect();
    let updated = ledger.apply_prices(&pairs)?;
    println!("Updated current prices on {updated} lot(s).");

    let held: std::collections::HashSet<&str> =
        ledger.lots().iter().map(|lot| lot.code.as_str()).collect();
    for code in codes {
        if !held.contains(code.trim().to_uppercase().as_str()) {
            println!(
                "{}",
                ui::style_text(
                    &format!("Note: no lot holds {}, price ignored.", code.trim()),
                    ui::StyleType::Subtle
                )
            );
        }
    }
    Ok(())
}

fn read_price_list(file: &Path) -> Result<Vec<(String, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(file)
        .with_context(|| format!("Failed to open price list: {}", file.display()))?;

    let mut pairs = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV at line {}", line + 1))?;
        let code = record
            .get(0)
            .with_context(|| format!("Missing code column at line {}", line + 1))?;
        let price: f64 = record
            .get(1)
            .with_context(|| format!("Missing price column at line {}", line + 1))?
            .parse()
            .with_context(|| format!("Unparseable price at line {}", line + 1))?;
        pairs.push((code.to_string(), price));
    }
    debug!(count = pairs.len(), "Read price list");
    Ok(pairs)
}
