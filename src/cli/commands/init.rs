//! `pcbcost init` command - Create a new session file

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::commands::template::TemplateSheet;
use crate::cli::GlobalOpts;
use crate::core::session::SessionFile;
use crate::core::source::{CsvWorkbook, TabularSink};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing session file
    #[arg(long)]
    pub force: bool,

    /// Also write an example rate workbook and process mapping next to the session
    #[arg(long)]
    pub samples: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = &global.session;

    if path.exists() && !args.force {
        println!(
            "{} Session already exists at {}",
            style("!").yellow(),
            style(path.display()).cyan()
        );
        println!();
        println!(
            "Use {} to overwrite it",
            style("pcbcost init --force").yellow()
        );
        return Ok(());
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !dir.exists() {
        std::fs::create_dir_all(dir).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(dir.display()).cyan()
        );
    }

    std::fs::write(path, SessionFile::template()).into_diagnostic()?;
    println!(
        "{} Created session {}",
        style("✓").green(),
        style(path.display()).cyan()
    );

    if args.samples {
        write_samples(dir)?;
    }

    if !global.quiet {
        println!();
        println!("Next steps:");
        println!(
            "  {} Fill in the parameters in {}",
            style("1.").dim(),
            style(path.display()).cyan()
        );
        println!(
            "  {} Pick NRE items",
            style("pcbcost nre catalog / pcbcost nre add <item>").yellow()
        );
        println!(
            "  {} Show the full estimate",
            style("pcbcost estimate").yellow()
        );
    }
    Ok(())
}

/// Write the example sheets the template session points at
fn write_samples(dir: &Path) -> Result<()> {
    let mut rates = CsvWorkbook::open(dir.join("rates"));
    let mut mapping = CsvWorkbook::open(dir);

    for sheet in TemplateSheet::ALL {
        let example = sheet.example();
        if sheet.in_rate_workbook() {
            rates.write_sheet(&example)?;
        } else {
            mapping.write_sheet(&example)?;
        }
    }

    println!(
        "{} Wrote example workbook {} and {}",
        style("✓").green(),
        style(rates.path().display()).cyan(),
        style(dir.join("process_mapping.csv").display()).cyan()
    );
    Ok(())
}
