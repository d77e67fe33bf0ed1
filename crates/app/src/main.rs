mod config;
mod pipeline;
mod progress;
mod report;

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{Cli, Config};

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        EnvFilter::new("off")
    } else if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = Config::from_cli(&cli);
    if config.print_config {
        config.print();
    }

    match pipeline::run(&config) {
        Ok(outcome) => {
            debug!(metrics = %outcome.metrics.export_text(), "run finished");
            report::print_outcome(&outcome.metrics, &outcome.output, config.units, config.print_metrics);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
