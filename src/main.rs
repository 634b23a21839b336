use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

mod aggregate;
mod bucket;
mod export;
mod filter;
mod loader;
mod models;
mod pipeline;
mod prep;
mod report;

use models::{DateColumn, FilterParams, Granularity, IssueTable};
use pipeline::{DashboardParams, Outcome};

#[derive(Parser)]
#[command(name = "issues-dashboard")]
#[command(about = "Deadline dashboard over spreadsheet issue exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Keep rows whose latest target date is on or after this date
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Keep rows whose latest target date is on or before this date
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Functional areas to keep (repeatable; omit to keep all)
    #[arg(long = "area")]
    areas: Vec<String>,
    /// Statuses to keep (repeatable; omit to keep all)
    #[arg(long = "status")]
    statuses: Vec<String>,
    /// Priority ratings to keep (repeatable; omit to keep all)
    #[arg(long = "rating")]
    ratings: Vec<String>,
    /// Single-area configuration, applied before the area filter
    #[arg(long)]
    locked_area: Option<String>,
}

impl FilterArgs {
    fn into_params(self) -> FilterParams {
        FilterParams {
            from: self.from,
            to: self.to,
            areas: self.areas,
            statuses: self.statuses,
            ratings: self.ratings,
            locked_area: self.locked_area,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load a spreadsheet and report its shape
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the aggregated time series
    Series {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "week")]
        granularity: Granularity,
        #[arg(long, default_value = "latest")]
        date_column: DateColumn,
        /// Replace counts with per-series running sums
        #[arg(long)]
        cumulative: bool,
        /// Emit the long-form series as JSON
        #[arg(long)]
        json: bool,
        /// Reference date for deadline buckets (defaults to today)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
    },
    /// Write a markdown dashboard report
    Report {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "week")]
        granularity: Granularity,
        #[arg(long, default_value = "latest")]
        date_column: DateColumn,
        #[arg(long)]
        cumulative: bool,
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the filtered table as xlsx or csv
    Export {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { input } => {
            let table = load(&input)?;
            println!(
                "Loaded {} rows, {} columns from {}.",
                table.records.len(),
                table.columns.len(),
                input.display()
            );
            let cleaned = prep::preprocess(&table);
            println!("{} rows remain after preprocessing.", cleaned.len());
            if table.has_owner {
                println!("Owner column present; owner breakdown available.");
            }
        }
        Commands::Series {
            input,
            filters,
            granularity,
            date_column,
            cumulative,
            json,
            reference_date,
        } => {
            let table = load(&input)?;
            let params = DashboardParams {
                filters: filters.into_params(),
                granularity,
                date_column,
                cumulative,
                reference_date: resolve_reference(reference_date),
            };
            match pipeline::run(&table, &params) {
                Outcome::NoData => println!("No rows match the current filters."),
                Outcome::Data(data) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&data.series)?);
                    } else {
                        for row in &data.series {
                            println!("{}  {}  {}", row.bucket, row.series, row.count);
                        }
                    }
                }
            }
        }
        Commands::Report {
            input,
            filters,
            granularity,
            date_column,
            cumulative,
            reference_date,
            out,
        } => {
            let table = load(&input)?;
            let params = DashboardParams {
                filters: filters.into_params(),
                granularity,
                date_column,
                cumulative,
                reference_date: resolve_reference(reference_date),
            };
            let outcome = pipeline::run(&table, &params);
            let rendered = report::build_report(&input.display().to_string(), &params, &outcome);
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            input,
            filters,
            reference_date,
            out,
        } => {
            let table = load(&input)?;
            let cleaned = prep::preprocess(&table);
            let filtered = filter::apply(&cleaned, &filters.into_params());
            if filtered.is_empty() {
                println!("No rows match the current filters; nothing exported.");
                return Ok(());
            }
            let reference = resolve_reference(reference_date);
            let extension = out
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_ascii_lowercase();
            let bytes = match extension.as_str() {
                "csv" => export::to_csv_bytes(&table.columns, &filtered, reference)?,
                _ => export::to_xlsx_bytes(&table.columns, &filtered, reference)?,
            };
            std::fs::write(&out, bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {} rows to {}.", filtered.len(), out.display());
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<IssueTable> {
    loader::load_path(path)
        .with_context(|| format!("failed to load {}", path.display()))
}

fn resolve_reference(reference_date: Option<NaiveDate>) -> NaiveDate {
    reference_date.unwrap_or_else(|| Utc::now().date_naive())
}
