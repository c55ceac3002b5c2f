//! Command-line front end: argument parsing, logging setup and the
//! `filter` / `plot` commands.

pub mod commands;
pub mod config;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use commands::filter::FilterArgs;
use commands::plot::PlotArgs;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "vocab-script",
    author,
    version,
    about = "Filter tokenizer vocabularies by Unicode script and chart their script mix"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Keep only the tokens written in the given scripts and save the tokenizer
    Filter(FilterArgs),
    /// Count tokens per script and draw the distribution
    Plot(PlotArgs),
}

/// Parses `args` (without the program name) and runs the selected command
pub fn run(args: &[String]) -> anyhow::Result<()> {
    let argv = std::iter::once("vocab-script").chain(args.iter().map(String::as_str));
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Command::Filter(args) => {
            let config = args.into_config();
            init_logging(config.verbose);
            commands::filter::execute(&config)
        }
        Command::Plot(args) => {
            let config = args.into_config();
            init_logging(config.verbose);
            commands::plot::execute(&config)
        }
    }
}

/// Logs go to stderr, `RUST_LOG` wins over the verbosity flag
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // A subscriber may already be installed when running in-process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
