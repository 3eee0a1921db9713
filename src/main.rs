use std::process;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use txreads::cli::Cli;
use txreads::run;

fn main() {
    let cli = Cli::parse();

    let filter = match EnvFilter::try_new(&cli.log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!(
                "{} invalid log level '{}': {}",
                "error:".red().bold(),
                cli.log_level,
                e
            );
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run::run(cli.command) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}
