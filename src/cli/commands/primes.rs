use super::super::output::Output;
use crate::config::{CliOverrides, FanjoinConfig, OutputFormat};
use crate::engine::{self, PrimeReport, RunOptions};
use crate::input::{parse_bound, parse_count};
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args)]
pub struct PrimesArgs {
    /// Lower bound of the range, inclusive
    #[arg(value_name = "LOWER", allow_hyphen_values = true)]
    pub lower: String,

    /// Upper bound of the range, inclusive
    #[arg(value_name = "UPPER", allow_hyphen_values = true)]
    pub upper: String,

    /// Number of workers (default: primes.workers from config, or derived from CPU count)
    #[arg(value_name = "N", allow_hyphen_values = true)]
    pub workers: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// List each partition with the primes it contributed
    #[arg(long)]
    pub show_partitions: bool,

    /// Show a completion bar while workers run
    #[arg(long)]
    pub progress: bool,
}

pub async fn execute(args: PrimesArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let lower = parse_bound(&args.lower, "LOWER")?;
    let upper = parse_bound(&args.upper, "UPPER")?;
    let workers = args
        .workers
        .as_deref()
        .map(|n| parse_count(n, "N"))
        .transpose()?;

    let overrides = CliOverrides {
        progress: args.progress.then_some(true),
        format: args.format,
        ..Default::default()
    };
    let config = FanjoinConfig::load_with(custom_config, &overrides)?;
    let workers = workers.unwrap_or_else(|| config.default_prime_workers());
    let options = RunOptions {
        progress: config.engine.progress && !output.is_quiet(),
    };

    output.verbose(&format!(
        "Enumerating primes in [{lower}, {upper}] with {workers} workers"
    ));
    let report = tokio::task::spawn_blocking(move || engine::run_primes(lower, upper, workers, options))
        .await
        .context("Prime enumeration task was cancelled")??;

    if let Some(adjustment) = report.plan.adjustment {
        output.warning(&format!(
            "Worker count adjusted from {} to {} to cover [{}, {}]",
            adjustment.requested, adjustment.effective, lower, upper
        ));
    }

    match config.output.format {
        OutputFormat::Text => {
            for line in render_text(&report, args.show_partitions) {
                output.result(&line);
            }
            output.success(&format!(
                "Found {} primes in [{}, {}] using {} workers",
                report.primes.len(),
                lower,
                upper,
                report.plan.num_partitions()
            ));
        }
        OutputFormat::Json => {
            output.result(&serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn join(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text lines for a prime report: optional per-partition lines, then all primes on one line
fn render_text(report: &PrimeReport, show_partitions: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if show_partitions {
        let mut offset = 0;
        for (partition, &count) in report.plan.iter().zip(&report.per_partition) {
            let primes = &report.primes[offset..offset + count];
            offset += count;
            lines.push(format!(
                "partition {} [{}, {}]: {}",
                partition.index,
                partition.start,
                partition.end,
                if primes.is_empty() {
                    "-".to_string()
                } else {
                    join(primes)
                }
            ));
        }
    }
    lines.push(join(&report.primes));
    lines
}
