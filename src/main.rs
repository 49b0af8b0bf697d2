//! linetune binary entry point.
//!
//! Logs go to stderr; stdout carries only the final `value<TAB>loss` line,
//! so the result stays pipeable.

use std::process::ExitCode;

use clap::Parser;

use linetune::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.into_config();
    match linetune::run(&config) {
        Ok(tuned) => {
            println!("{tuned}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("linetune: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
