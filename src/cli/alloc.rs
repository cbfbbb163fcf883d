use super::ui;
use crate::core::Ledger;
use crate::core::compose::{CompositionTable, decompose};
use anyhow::Result;
use comfy_table::Cell;

/// Renders the look-through asset exposure table.
pub fn run(ledger: &Ledger, table: &CompositionTable) -> Result<()> {
    if ledger.is_empty() {
        println!(
            "{}",
            ui::style_text("Ledger is empty. Add a lot first.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let report = decompose(ledger.lots(), table);
    let total: f64 = report.iter().map(|r| r.value).sum();

    let mut out = ui::new_styled_table();
    out.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Value (TL)"),
        ui::header_cell("Share (%)"),
    ]);
    for exposure in &report {
        out.add_row(vec![
            Cell::new(&exposure.asset),
            ui::format_optional_cell(Some(exposure.value), |v| format!("{v:.2}")),
            ui::format_optional_cell(Some(exposure.percentage), |v| format!("{v:.2}%")),
        ]);
    }

    println!(
        "{}",
        ui::style_text(
            &format!("Asset Exposure (composition v{})", table.version),
            ui::StyleType::Title
        )
    );
    println!("\n{out}");
    println!(
        "\n{} {}",
        ui::style_text("Total:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{total:.2} TL"), ui::StyleType::TotalValue)
    );
    Ok(())
}
