use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use cadence_io::{ExperimentName, ReportWriter, TableReader, WindowSummary};
use cadence_model::trailing_window;
use cadence_window::{DatasetBuilder, SampleStream, WidthSet, WindowSampler, mean_features};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Randomized odd-width windowing and trailing-window inspection for time-series tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Partition a labeled table into random odd-width windows and write them as JSON
    Windows {
        /// Path to the labeled CSV file (last column is the label)
        #[arg(long)]
        data: PathBuf,

        /// Comma-separated odd window widths, e.g. 1,3,5
        #[arg(long, value_delimiter = ',', required = true)]
        widths: Vec<usize>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show the trailing window live inference would aggregate for one row
    Trailing {
        /// Path to the unlabeled CSV file (every column is a feature)
        #[arg(long)]
        data: PathBuf,

        /// Comma-separated odd window widths, e.g. 1,3,5
        #[arg(long, value_delimiter = ',', required = true)]
        widths: Vec<usize>,

        /// Zero-based anchor row
        #[arg(long)]
        row: usize,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct WindowsOutput {
    experiment: String,
    windows_file: PathBuf,
    widths: Vec<usize>,
    seed: u64,
    #[serde(flatten)]
    summary: WindowSummary,
}

#[derive(Serialize)]
struct TrailingOutput {
    row_index: usize,
    min_width: usize,
    start: usize,
    end: usize,
    features: Vec<FeatureMean>,
}

#[derive(Serialize)]
struct FeatureMean {
    name: String,
    mean: f64,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Windows {
            data,
            widths,
            experiment,
            output_dir,
        } => {
            let experiment = ExperimentName::new(experiment)?;
            let widths = WidthSet::new(widths).context("invalid --widths")?;

            let table = TableReader::new(&data)
                .read()
                .with_context(|| format!("failed to read {}", data.display()))?;

            let builder = DatasetBuilder::new(WindowSampler::new(widths.clone()));
            let mut stream = SampleStream::new(cli.seed);
            let dataset = builder
                .build(&table, &mut stream, Some(cli.seed))
                .context("windowing failed")?;

            let writer = ReportWriter::new(&output_dir, experiment.clone())?;
            let windows_file =
                writer.write_windows(&widths, cli.seed, table.n_rows(), &dataset)?;

            print_json(&WindowsOutput {
                experiment: experiment.to_string(),
                windows_file,
                widths: widths.into(),
                seed: cli.seed,
                summary: WindowSummary::new(table.n_rows(), &dataset),
            })?;
        }

        Command::Trailing { data, widths, row } => {
            let widths = WidthSet::new(widths).context("invalid --widths")?;
            let frame = TableReader::new(&data)
                .read_features()
                .with_context(|| format!("failed to read {}", data.display()))?;

            let window = trailing_window(&widths, frame.n_rows(), row)?;

            let means = mean_features(&frame.rows()[window.range()])
                .context("failed to aggregate trailing window")?;
            info!(%window, "trailing window aggregated");

            print_json(&TrailingOutput {
                row_index: row,
                min_width: widths.min(),
                start: window.start,
                end: window.end() - 1,
                features: frame
                    .feature_names()
                    .iter()
                    .zip(means)
                    .map(|(name, mean)| FeatureMean {
                        name: name.clone(),
                        mean,
                    })
                    .collect(),
            })?;
        }
    }

    Ok(())
}
