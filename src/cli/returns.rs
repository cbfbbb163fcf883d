use super::ui;
use crate::core::lot::SnapshotState;
use crate::core::report::{PortfolioReport, build_report};
use crate::core::{Benchmark, Ledger, RateCache};
use anyhow::Result;
use chrono::Local;
use comfy_table::Cell;

/// Renders real returns against every configured benchmark. The default is
/// the relative (percentage) form; `absolute` switches to purchasing-power
/// deltas in benchmark units.
pub async fn run(
    ledger: &Ledger,
    benchmarks: &[Benchmark],
    cache: &RateCache,
    composition: &crate::core::compose::CompositionTable,
    absolute: bool,
) -> Result<()> {
    if ledger.is_empty() {
        println!(
            "{}",
            ui::style_text("Ledger is empty. Add a lot first.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let market_count = benchmarks.iter().filter(|b| b.needs_snapshot()).count();
    let pb = ui::new_progress_bar(market_count as u64, true);
    pb.set_message("Fetching live rates...");
    let report = build_report(
        ledger.lots(),
        benchmarks,
        cache,
        composition,
        Local::now().date_naive(),
        &|| pb.inc(1),
    )
    .await;
    pb.finish_and_clear();

    println!(
        "{}",
        ui::style_text(
            if absolute {
                "Purchasing Power vs Benchmarks"
            } else {
                "Real Returns vs Benchmarks"
            },
            ui::StyleType::Title
        )
    );
    println!("\n{}", render_table(&report, benchmarks, absolute));
    render_totals(&report, benchmarks, absolute);

    for row in &report.rows {
        if row.snapshot_state == SnapshotState::Failed {
            println!(
                "{}",
                ui::style_text(
                    &format!(
                        "Warning: lot {} ({}) has an incomplete acquisition snapshot; \
                         run `reel retry-snapshot {}` to fetch it again.",
                        row.id, row.code, row.id
                    ),
                    ui::StyleType::Warning
                )
            );
        }
    }
    Ok(())
}

fn render_table(report: &PortfolioReport, benchmarks: &[Benchmark], absolute: bool) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![
        ui::header_cell("Id"),
        ui::header_cell("Code"),
        ui::header_cell("Value (TL)"),
        ui::header_cell("Nominal (%)"),
    ];
    for benchmark in benchmarks.iter().filter(|b| b.needs_snapshot()) {
        let label = if absolute {
            format!("{} ({})", benchmark.id, benchmark.unit)
        } else {
            format!("{} (%)", benchmark.id)
        };
        header.push(ui::header_cell(&label));
    }
    header.push(ui::header_cell("vs Inflation (TL)"));
    table.set_header(header);

    for row in &report.rows {
        let mut cells = vec![
            Cell::new(row.id),
            Cell::new(&row.code),
            ui::format_optional_cell(Some(row.value), |v| format!("{v:.2}")),
            ui::signed_cell(row.nominal_return_pct, |v| format!("{v:+.2}%")),
        ];
        for benchmark in benchmarks.iter().filter(|b| b.needs_snapshot()) {
            let perf = &row.benchmarks[&benchmark.id];
            cells.push(if absolute {
                ui::signed_cell(perf.delta, |v| format!("{v:+.2}"))
            } else {
                ui::signed_cell(perf.pct, |v| format!("{v:+.2}%"))
            });
        }
        cells.push(ui::signed_cell(row.inflation_delta, |v| format!("{v:+.2}")));
        table.add_row(cells);
    }
    table.to_string()
}

fn render_totals(report: &PortfolioReport, benchmarks: &[Benchmark], absolute: bool) {
    let mut parts = Vec::new();
    for benchmark in benchmarks.iter().filter(|b| b.needs_snapshot()) {
        let agg = &report.benchmark_totals[&benchmark.id];
        let value = if absolute {
            agg.performance
                .delta
                .map(|v| format!("{v:+.2} {}", benchmark.unit))
        } else {
            agg.performance.pct.map(|v| format!("{v:+.2}%"))
        };
        let excluded = report.rows.len() - agg.lots_included;
        let mut text = value.unwrap_or_else(|| "N/A".to_string());
        if excluded > 0 && agg.lots_included > 0 {
            text.push_str(&format!(" ({excluded} lot(s) excluded)"));
        }
        parts.push(format!("{}: {}", benchmark.id, text));
    }
    if let Some(total) = report.inflation_total {
        parts.push(format!("vs inflation: {total:+.2} TL"));
    }
    println!(
        "\n{} {}",
        ui::style_text("Portfolio:", ui::StyleType::TotalLabel),
        parts.join("  |  ")
    );
}
