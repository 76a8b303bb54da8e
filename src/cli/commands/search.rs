use super::super::output::Output;
use crate::config::{CliOverrides, FanjoinConfig, OutputFormat};
use crate::engine::{self, GridSearchReport, RunOptions};
use crate::error::FanjoinError;
use crate::input::Grid;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct SearchArgs {
    /// Whitespace-separated matrix, row by row; reads stdin when omitted or "-"
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Number of rows to read (default: search.rows from config)
    #[arg(long)]
    pub rows: Option<usize>,

    /// Number of columns to read (default: search.cols from config)
    #[arg(long)]
    pub cols: Option<usize>,

    /// Value to search for (default: search.target from config)
    #[arg(long, allow_hyphen_values = true)]
    pub target: Option<i64>,

    /// Number of workers, at least 1 (default: search.workers from config, or one per row)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Show a completion bar while workers run
    #[arg(long)]
    pub progress: bool,
}

pub async fn execute(args: SearchArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let overrides = CliOverrides {
        progress: args.progress.then_some(true),
        target: args.target,
        rows: args.rows,
        cols: args.cols,
        format: args.format,
        ..Default::default()
    };
    let config = FanjoinConfig::load_with(custom_config, &overrides)?;
    let (rows, cols, target) = (config.search.rows, config.search.cols, config.search.target);
    let workers = args.workers.or_else(|| config.search_workers());
    let options = RunOptions {
        progress: config.engine.progress && !output.is_quiet(),
    };

    let source = match args.file {
        Some(path) if path.as_os_str() != "-" => Some(path),
        _ => None,
    };
    output.verbose(&format!(
        "Reading {}x{} grid from {}",
        rows,
        cols,
        source
            .as_ref()
            .map_or_else(|| "stdin".to_string(), |p| p.display().to_string())
    ));

    let report = tokio::task::spawn_blocking(move || -> Result<GridSearchReport> {
        let grid = read_grid(source, rows, cols)?;
        Ok(engine::run_search(&grid, target, workers, options)?)
    })
    .await
    .context("Grid search task was cancelled")??;

    if let Some(adjustment) = report.plan.adjustment {
        output.warning(&format!(
            "Worker count adjusted from {} to {} for {} rows",
            adjustment.requested, adjustment.effective, rows
        ));
    }

    match config.output.format {
        OutputFormat::Text => {
            output.result(&render_text(&report));
            output.verbose(&format!("{} workers searched {} rows", report.search.workers, rows));
        }
        OutputFormat::Json => output.result(&serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn read_grid(source: Option<PathBuf>, rows: usize, cols: usize) -> Result<Grid> {
    let grid = match source {
        Some(path) => {
            let file = std::fs::File::open(&path).map_err(|e| {
                FanjoinError::Input(format!("failed to open {}: {}", path.display(), e))
            })?;
            Grid::read_from(std::io::BufReader::new(file), rows, cols)?
        }
        None => Grid::read_from(std::io::stdin().lock(), rows, cols)?,
    };
    Ok(grid)
}

fn render_text(report: &GridSearchReport) -> String {
    match &report.search.hit {
        Some(hit) => format!(
            "found {} at row {}, col {} by worker {} (partition {})",
            report.target, hit.location.row, hit.location.col, hit.owner, hit.partition
        ),
        None => format!("{} not found", report.target),
    }
}
