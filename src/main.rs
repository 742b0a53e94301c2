use anyhow::Result;
use clap::{ArgAction, Parser};
use lyra::{Commands, handle_command};
use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lyra")]
#[command(version)]
#[command(about = "Lyra - workflow tooling for Cygnus, the Lyra server components", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace). RUST_LOG takes precedence.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "lyra=debug",
        _ => "lyra=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Diagnostics go to stderr; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::trace!(command = ?cli.command, "dispatching command");
    handle_command(cli.command)
}
