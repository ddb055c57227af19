//! `pcbcost template` command - Print the CSV layout of a workbook sheet

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::source::{sheets, Sheet};
use crate::engine::{nre, process, rates};

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Sheet to print
    #[arg(value_enum)]
    pub sheet: TemplateSheet,

    /// Print the header row only
    #[arg(long)]
    pub headers_only: bool,
}

/// Sheets a session reads
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateSheet {
    /// Shift pattern (`Process_CT`)
    ProcessCt,
    /// Labor rates (`Assumptions`)
    Assumptions,
    /// NRE catalog (`NRE`)
    Nre,
    /// Machine minute rates (`MMR-EMS`)
    MmrEms,
    /// Process mapping, one row per stage
    ProcessMapping,
}

impl TemplateSheet {
    pub const ALL: [TemplateSheet; 5] = [
        TemplateSheet::ProcessCt,
        TemplateSheet::Assumptions,
        TemplateSheet::Nre,
        TemplateSheet::MmrEms,
        TemplateSheet::ProcessMapping,
    ];

    /// Sheet name as stored in a workbook
    pub fn sheet_name(&self) -> &'static str {
        match self {
            TemplateSheet::ProcessCt => sheets::PROCESS_CT,
            TemplateSheet::Assumptions => sheets::ASSUMPTIONS,
            TemplateSheet::Nre => sheets::NRE,
            TemplateSheet::MmrEms => sheets::MMR_EMS,
            TemplateSheet::ProcessMapping => "process_mapping",
        }
    }

    /// Whether the sheet lives in the rate workbook rather than the mapping file
    pub fn in_rate_workbook(&self) -> bool {
        !matches!(self, TemplateSheet::ProcessMapping)
    }

    /// The sheet with example rows
    pub fn example(&self) -> Sheet {
        let name = self.sheet_name();
        match self {
            TemplateSheet::ProcessCt => {
                Sheet::from_rows(name, rates::columns::PROCESS_CT, &[&["8", "5", "50", "0.85"]])
            }
            TemplateSheet::Assumptions => {
                Sheet::from_rows(name, rates::columns::ASSUMPTIONS, &[&["360", "180"]])
            }
            TemplateSheet::Nre => Sheet::from_rows(
                name,
                nre::columns::LINE,
                &[
                    &["Stencil", "1000", "500", "", ""],
                    &["ICT Fixture", "25000", "100000", "", ""],
                    &["Reflow Pallet", "4000", "", "", ""],
                ],
            ),
            TemplateSheet::MmrEms => Sheet::from_rows(
                name,
                rates::columns::MMR_EMS,
                &[&["SMT", "0.25"], &["AOI", "0.1"], &["Wave Solder", "0.15"]],
            ),
            TemplateSheet::ProcessMapping => Sheet::from_rows(
                name,
                &[
                    process::columns::STAGE,
                    process::columns::PROCESS_CYCLE_TIME,
                    process::columns::BATCH_SETUP_TIME,
                    process::columns::DL_FTE,
                    process::columns::IDL_FTE,
                    process::columns::FTE_FOR_BATCH_SETUP,
                ],
                &[
                    &["SMT", "60", "1800", "1", "0.5", "2"],
                    &["AOI", "20", "600", "1", "0", "1"],
                    &["Manual Assembly", "120", "", "2", "0.5", ""],
                ],
            ),
        }
    }
}

pub fn run(args: TemplateArgs) -> Result<()> {
    let sheet = args.sheet.example();

    // Output to stdout (can be redirected to file)
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(&sheet.headers).into_diagnostic()?;
    if !args.headers_only {
        for row in &sheet.rows {
            wtr.write_record(row).into_diagnostic()?;
        }
    }
    wtr.flush().into_diagnostic()?;

    // Print usage hint to stderr so it doesn't interfere with redirected output
    let target = if args.sheet.in_rate_workbook() {
        format!("<workbook>/{}.csv", sheet.name)
    } else {
        format!("{}.csv", sheet.name)
    };
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: pcbcost template {} > {}",
        style("→").blue(),
        args.sheet
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default(),
        target
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nre::NreCatalog;
    use crate::engine::process::load_process_stages;
    use crate::engine::rates::{load_machine_rates, RateContext};

    #[test]
    fn test_examples_load_through_engines() {
        let ctx = RateContext::from_sheets(
            &TemplateSheet::ProcessCt.example(),
            &TemplateSheet::Assumptions.example(),
        )
        .unwrap();
        assert_eq!(ctx.hours_per_year_per_shift(), 2000.0);

        assert_eq!(NreCatalog::from_sheet(&TemplateSheet::Nre.example()).unwrap().len(), 3);
        assert_eq!(load_machine_rates(&TemplateSheet::MmrEms.example()).unwrap().len(), 3);
        assert_eq!(
            load_process_stages(&TemplateSheet::ProcessMapping.example())
                .unwrap()
                .len(),
            3
        );
    }
}
