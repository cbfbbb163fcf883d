use super::ui;
use crate::core::Ledger;
use crate::core::valuation::{lot_cost, lot_value, nominal_return_pct, value_portfolio};
use anyhow::Result;
use comfy_table::Cell;

/// Renders the nominal valuation table: cost basis, current value and PnL
/// per lot plus the aggregate row. Needs no rate fetches.
pub fn run(ledger: &Ledger) -> Result<()> {
    if ledger.is_empty() {
        println!(
            "{}",
            ui::style_text("Ledger is empty. Add a lot first.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Code"),
        ui::header_cell("Units"),
        ui::header_cell("Cost (TL)"),
        ui::header_cell("Value (TL)"),
        ui::header_cell("PnL (TL)"),
        ui::header_cell("Return (%)"),
    ]);

    for lot in ledger.lots() {
        let cost = lot_cost(lot);
        let value = lot_value(lot);
        table.add_row(vec![
            Cell::new(lot.id),
            Cell::new(&lot.code),
            ui::format_optional_cell(Some(lot.quantity), |u| format!("{u:.2}")),
            ui::format_optional_cell(Some(cost), |v| format!("{v:.2}")),
            ui::format_optional_cell(Some(value), |v| format!("{v:.2}")),
            ui::signed_cell(Some(value - cost), |v| format!("{v:+.2}")),
            ui::signed_cell(nominal_return_pct(lot), |v| format!("{v:+.2}%")),
        ]);
    }

    println!("{}", ui::style_text("Portfolio Summary", ui::StyleType::Title));
    println!("\n{table}");

    let totals = value_portfolio(ledger.lots());
    let pct = totals
        .nominal_return_pct
        .map_or("N/A".to_string(), |v| format!("{v:+.2}%"));
    println!(
        "\n{} {:.2} TL -> {:.2} TL ({})",
        ui::style_text("Total:", ui::StyleType::TotalLabel),
        totals.cost,
        ui::style_text(&format!("{:.2}", totals.value), ui::StyleType::TotalValue),
        pct
    );

    Ok(())
}
