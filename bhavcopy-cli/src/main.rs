//! Bhavcopy CLI: merged cash-market and derivatives bhavcopy retrieval.
//!
//! Commands:
//! - `cm` cash-market bhavcopy for symbols × series over a date range
//! - `fo` derivatives bhavcopy for symbols (defaults to all stored history)
//! - `tables` list the physical tables and their schemas

mod demo;

use anyhow::{Context, Result};
use bhavcopy_core::data::{AggregateResult, FanOutReport, RecordSet, TableId};
use bhavcopy_core::storage::{PostgresStorage, Storage};
use bhavcopy_core::{frame, BhavcopyClient, DbConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bhavcopy",
    about = "Bhavcopy CLI: merged legacy and UDIFF bhavcopy retrieval"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cash-market bhavcopy for every symbol and series.
    Cm {
        /// Start date (e.g. 2023-01-01).
        #[arg(long)]
        start: String,

        /// End date, inclusive.
        #[arg(long)]
        end: String,

        /// Symbols, comma separated or repeated (e.g. TCS,INFY).
        #[arg(long, required = true, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Series codes, comma separated or repeated.
        #[arg(long, value_delimiter = ',', default_value = "EQ")]
        series: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Derivatives bhavcopy for every symbol.
    Fo {
        /// Start date. Defaults to 2016-01-01.
        #[arg(long)]
        start: Option<String>,

        /// End date, inclusive. Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Symbols, comma separated or repeated (e.g. BANKNIFTY,NIFTY).
        #[arg(long, required = true, value_delimiter = ',')]
        symbols: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// List the physical tables and their column counts.
    Tables,
}

#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML file with database settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Query built-in sample data instead of a database.
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Write the merged result here (.csv, .parquet or .json).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Cm {
            start,
            end,
            symbols,
            series,
            source,
        } => {
            let client = build_client(&source)?;
            let result = client.get_cash_market_bhavcopy(&start, &end, symbols, series)?;
            finish(result, &source, "BhavCopy Data Retrieved:")
        }
        Commands::Fo {
            start,
            end,
            symbols,
            source,
        } => {
            let client = build_client(&source)?;
            let result = match (start, end) {
                (None, None) => client.get_derivatives_bhavcopy_default_range(symbols)?,
                (start, end) => {
                    let start = start.unwrap_or_else(|| "2016-01-01".to_string());
                    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
                    client.get_derivatives_bhavcopy(start, end, symbols)?
                }
            };
            finish(result, &source, "FO BhavCopy Data Retrieved:")
        }
        Commands::Tables => {
            print_tables();
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(source: &SourceArgs) -> Result<BhavcopyClient> {
    if source.demo {
        info!("using demo storage");
        return Ok(BhavcopyClient::new(
            Box::new(demo::sample_storage()),
            DbConfig::default(),
        ));
    }

    let config = match &source.config {
        Some(path) => DbConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DbConfig::default(),
    }
    .with_env_overrides()?;

    let storage: Box<dyn Storage> = Box::new(PostgresStorage::new()?);
    info!(?config, "using postgres storage");
    Ok(BhavcopyClient::new(storage, config))
}

fn finish(result: AggregateResult, source: &SourceArgs, title: &str) -> Result<()> {
    if result.is_empty() {
        println!("No data found for the specified criteria.");
    } else {
        println!("{title}");
        print!("{}", render_table(&result.records));
    }

    if let Some(path) = &source.output {
        let format = frame::write(&result.records, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!(
            "Wrote {} rows to {} ({format:?})",
            result.len(),
            path.display()
        );
    }

    print_report(&result.report);
    Ok(())
}

/// Render the columns that hold at least one value, padded to width.
fn render_table(records: &RecordSet) -> String {
    let populated: Vec<usize> = (0..records.width())
        .filter(|&c| records.rows().iter().any(|row| !row[c].is_null()))
        .collect();

    let cells: Vec<Vec<String>> = records
        .rows()
        .iter()
        .map(|row| populated.iter().map(|&c| row[c].to_string()).collect())
        .collect();

    let widths: Vec<usize> = populated
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(records.columns()[c].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = populated
        .iter()
        .zip(&widths)
        .map(|(&c, &w)| format!("{:>w$}", records.columns()[c]))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:>w$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn print_report(report: &FanOutReport) {
    if report.is_complete() {
        return;
    }
    eprintln!(
        "\n{} of {} items succeeded",
        report.items_succeeded, report.items_attempted
    );
    for item in &report.skipped {
        match &item.series {
            Some(series) => eprintln!("  skipped {} [{series}]: {}", item.instrument, item.reason),
            None => eprintln!("  skipped {}: {}", item.instrument, item.reason),
        }
    }
    if report.stopped_early {
        eprintln!("  stopped after the first failure; later instruments were not queried");
    }
}

fn print_tables() {
    println!(
        "{:<22} {:>8} {:>8} {:>8}",
        "TABLE", "SEGMENT", "COLUMNS", "MAPPED"
    );
    for table in TableId::ALL {
        let mapped = table
            .mapping()
            .map_or_else(|| "-".to_string(), |m| m.len().to_string());
        println!(
            "{:<22} {:>8} {:>8} {:>8}",
            table.table_name(),
            table.segment().to_string(),
            table.columns().len(),
            mapped
        );
    }
}
