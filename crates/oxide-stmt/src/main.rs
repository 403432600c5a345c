//! oxide-stmt CLI
//!
//! Command-line tool for generating and running MySQL statements.

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use oxide_stmt::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(&cli, &mut std::io::stdout().lock())
}
