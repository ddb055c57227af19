use clap::Parser;
use miette::Result;
use pcbcost::cli::commands;
use pcbcost::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    // Recovered conditions already reach the user as warnings; keep the log quiet by default
    let default = if verbose { "pcbcost=debug" } else { "pcbcost=error" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    // stdout carries reports, so logs always go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` terminates quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.verbose);

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Template(args) => commands::template::run(args),
        Commands::Rates(args) => commands::rates::run(args, &global),
        Commands::Nre(cmd) => commands::nre::run(cmd, &global),
        Commands::Process(args) => commands::process::run(args, &global),
        Commands::Consumables(args) => commands::consumables::run(args, &global),
        Commands::Estimate(args) => commands::estimate::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
