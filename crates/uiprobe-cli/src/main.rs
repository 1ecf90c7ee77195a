//! uiprobe CLI: drive popup dialogs from the command line
//!
//! ## Usage
//!
//! ```bash
//! uiprobe click-popup --scene dialogs.yaml --timeout 5 OK
//! uiprobe doc-status TestSuites/Login/TestScript.py
//! uiprobe config --format json
//! ```

use clap::Parser;
use std::process::ExitCode;
use uiprobe_cli::{
    handlers, logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Reporter, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        // The reporter has already printed the failed check
        Err(e) if e.is_test_failure() => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    let use_color = config.color.should_color();

    logging::init(config.verbosity, use_color);
    let reporter = Reporter::new(use_color, config.verbosity.is_quiet());
    let probe = handlers::load_probe_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::ClickPopup(args) => handlers::run_click_popup(&probe, &reporter, args),
        Commands::DocStatus(args) => handlers::run_doc_status(&probe, &reporter, args),
        Commands::Config(args) => handlers::run_config(&probe, &reporter, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
}
