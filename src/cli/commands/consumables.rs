//! `pcbcost consumables` command - Consumable cost per board

use console::style;
use miette::Result;

use crate::cli::helpers::{
    compute_report, effective_format, format_money, load_session, print_structured,
    print_warnings,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::Warning;
use crate::core::params::fields;
use crate::engine::consumables::ConsumableCosts;

#[derive(clap::Args, Debug)]
pub struct ConsumablesArgs {}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("consumable", "CONSUMABLE", 24),
    ColumnDef::new("quantity", "QUANTITY", 14),
    ColumnDef::new("cost", "COST/BOARD", 14),
];

fn rows(costs: &ConsumableCosts) -> Vec<TableRow> {
    let row = |name: &str, quantity: f64, cost: f64| {
        TableRow::new()
            .cell("consumable", CellValue::Text(name.to_string()))
            .cell("quantity", CellValue::Float(Some(quantity), 4))
            .cell("cost", CellValue::Money(Some(cost), costs.currency))
    };
    vec![
        row("RTV glue (g)", costs.glue.weight_per_board, costs.glue.cost_per_board),
        row("Solder paste top (g)", costs.paste.top.weight, costs.paste.top.cost),
        row(
            "Solder paste bottom (g)",
            costs.paste.bottom.weight,
            costs.paste.bottom.cost,
        ),
        row("Flux (ml)", costs.flux.spread_area, costs.flux.cost_per_board),
    ]
}

/// Fields the consumable engine reads
const CONSUMABLE_FIELDS: &[&str] = &[
    fields::GLUE_WEIGHT,
    fields::GLUE_SPECIFIC_GRAVITY,
    fields::GLUE_WASTAGE,
    fields::GLUE_UNIT_COST,
    fields::BOARD_LENGTH,
    fields::BOARD_WIDTH,
    fields::PASTE_THICKNESS,
    fields::TOP_WEIGHT_ESTIMATE,
    fields::TOP_PASTE_WASTAGE,
    fields::BOTTOM_WEIGHT_ESTIMATE,
    fields::BOTTOM_PASTE_WASTAGE,
    fields::FLUX_WASTAGE,
];

pub fn run(_args: ConsumablesArgs, global: &GlobalOpts) -> Result<()> {
    let (_, session) = load_session(global)?;
    let (_, report) = compute_report(global, &session);
    let costs = &report.consumables;

    let input_warnings: Vec<Warning> = report
        .warnings
        .iter()
        .filter(|w| {
            matches!(w, Warning::InvalidNumber { field, .. }
                if CONSUMABLE_FIELDS.contains(&field.as_str()))
        })
        .cloned()
        .collect();
    print_warnings(&input_warnings, global);

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(costs, format)? {
        return Ok(());
    }

    let formatter = TableFormatter::new(COLUMNS, "consumable").without_summary();
    formatter.output(&rows(costs), format);
    if format != OutputFormat::Tsv {
        return Ok(());
    }

    println!();
    println!(
        "{}: {:.4} g",
        style("Solder paste at 100% coverage").bold(),
        costs.paste.weight_100
    );
    println!("{}: {} mm²", style("Board area").bold(), costs.flux.board_area);
    println!(
        "{}: {}",
        style("Consumables per board").bold(),
        style(format_money(costs.total_per_board(), costs.currency)).cyan()
    );
    Ok(())
}
