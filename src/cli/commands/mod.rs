use super::output::Output;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

pub mod config;
pub mod primes;
pub mod search;
pub mod version;

#[derive(Parser)]
#[command(
    name = "fanjoin",
    version = env!("CARGO_PKG_VERSION"),
    about = "Partition a range across concurrent workers and join their results",
    long_about = "fanjoin splits a domain into contiguous partitions, runs one worker thread per \
                  partition, waits for all of them at a single barrier and aggregates the results: \
                  partition-ordered prime enumeration, or a first-match grid search."
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enumerate the primes of [LOWER, UPPER] across N workers
    Primes(primes::PrimesArgs),
    /// Search a matrix for a value, one worker per row
    Search(search::SearchArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Show version information
    Version(version::VersionArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = self.output();

        match self.command {
            Some(Commands::Primes(args)) => {
                primes::execute(args, self.config.as_deref(), &output).await
            }
            Some(Commands::Search(args)) => {
                search::execute(args, self.config.as_deref(), &output).await
            }
            Some(Commands::Config(args)) => {
                config::execute(args, self.config.as_deref(), &output).await
            }
            Some(Commands::Version(args)) => version::execute(args).await,
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        }
    }

    pub fn output(&self) -> Output {
        Output::new(self.verbose > 0, self.quiet)
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // A second init (tests driving `run` twice) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
