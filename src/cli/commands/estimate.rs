//! `pcbcost estimate` command - Full cost estimate with OH&P roll-up

use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{
    compute_report, effective_format, format_money, load_session, print_warnings, write_output,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::session::CostReport;

#[derive(clap::Args, Debug)]
pub struct EstimateArgs {
    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// The report as written in JSON and YAML
#[derive(Serialize)]
struct EstimateDocument<'a> {
    generated: DateTime<Utc>,
    session: String,
    #[serde(flatten)]
    report: &'a CostReport,
}

/// Label and amount of each roll-up line, in roll-up order
fn summary_lines(report: &CostReport) -> Vec<(String, f64)> {
    let s = &report.summary;
    let r = &report.overhead_rates;
    vec![
        ("PCB + Components + Mechanical".to_string(), s.pcb_comp_mech_cost),
        ("NRE Per Unit".to_string(), s.nre_cost),
        ("Consumables".to_string(), s.consumables_cost),
        ("Material Cost".to_string(), s.material_cost),
        ("Manufacturing Cost".to_string(), s.manufacturing_cost),
        (format!("MOH ({})", r.moh), s.moh_cost),
        (format!("FOH ({})", r.foh), s.foh_cost),
        (format!("Profit on RM ({})", r.profit_on_rm), s.profit_on_rm),
        (format!("Profit on VA ({})", r.profit_on_va), s.profit_on_va),
        ("OH&P Cost".to_string(), s.ohp_cost),
        (format!("R&D ({})", r.rnd), s.rnd_cost),
        (format!("Warranty ({})", r.warranty), s.warranty_cost),
        (format!("SG&A ({})", r.sga), s.sga_cost),
        ("Grand Total".to_string(), s.grand_total),
        ("RM Cost".to_string(), s.rm_cost),
        ("Conversion Cost".to_string(), s.conversion_cost),
    ]
}

fn render_markdown(report: &CostReport, session: &str, generated: DateTime<Utc>) -> String {
    let mut output = String::new();
    output.push_str("# PCBA Cost Estimate\n\n");
    output.push_str(&format!("- **Session:** {}\n", session));
    if let Some(stage) = report.stage {
        output.push_str(&format!("- **Development Stage:** {}\n", stage));
    }
    output.push_str(&format!(
        "- **Product Volume:** {} ({} per year x {} years)\n",
        report.product_volume, report.volume.annual_volume, report.volume.product_life
    ));
    output.push_str(&format!(
        "- **Generated:** {}\n\n",
        generated.format("%Y-%m-%d %H:%M UTC")
    ));

    // Build table with tabled
    let mut builder = Builder::default();
    builder.push_record(["Cost Element", "Amount"]);
    for (label, amount) in summary_lines(report) {
        builder.push_record([label, format_money(amount, report.summary.currency)]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');

    let errors = report.block_errors();
    if !errors.is_empty() {
        output.push_str("\n## Not Computed\n\n");
        for (block, e) in errors {
            output.push_str(&format!("- **{}:** {} (counted as 0)\n", block, e));
        }
    }

    if !report.warnings.is_empty() {
        output.push_str("\n## Warnings\n\n");
        for warning in &report.warnings {
            output.push_str(&format!("- {}\n", warning));
        }
    }
    output
}

fn render_csv(report: &CostReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["Cost Element", "Amount"]).into_diagnostic()?;
    for (label, amount) in summary_lines(report) {
        wtr.write_record([label, amount.to_string()]).into_diagnostic()?;
    }
    let bytes = wtr.into_inner().into_diagnostic()?;
    String::from_utf8(bytes).into_diagnostic()
}

pub fn run(args: EstimateArgs, global: &GlobalOpts) -> Result<()> {
    let (path, session) = load_session(global)?;
    let (_, report) = compute_report(global, &session);
    let generated = Utc::now();
    let session_name = path.display().to_string();

    let format = effective_format(global, OutputFormat::Md);
    let output = match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let doc = EstimateDocument {
                generated,
                session: session_name,
                report: &report,
            };
            if format == OutputFormat::Json {
                let mut json = serde_json::to_string_pretty(&doc).into_diagnostic()?;
                json.push('\n');
                json
            } else {
                serde_yml::to_string(&doc).into_diagnostic()?
            }
        }
        OutputFormat::Csv => {
            print_warnings(&report.warnings, global);
            render_csv(&report)?
        }
        _ => render_markdown(&report, &session_name, generated),
    };

    write_output(&output, args.output.as_deref())
}
