use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

use bgpsimulator::engine_runner::{EngineRunConfig, EngineRunner};
use bgpsimulator::SnapshotMergeRule;

/// Simulate BGP route propagation with partial ROV adoption over a CAIDA AS graph.
#[derive(Debug, Parser)]
#[clap(name = "bgpsimulator", version)]
struct Cli {
    /// Directory holding the relationship snapshots, anns.csv and rov_asns.csv
    dataset_dir: PathBuf,
    /// How the two relationship snapshots are combined
    #[clap(long = "merge-rule", value_enum, default_value_t = SnapshotMergeRule::LaterWins)]
    merge_rule: SnapshotMergeRule,
    /// Give up after this many propagation steps (default: derived from the input size)
    #[clap(long = "max-steps")]
    max_steps: Option<usize>,
    /// Add an origin_asn column to the output
    #[clap(long = "include-origin")]
    include_origin: bool,
    /// Output file (default: <dataset_dir>/my_ribs.csv)
    #[clap(long = "output", short = 'o')]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger();

    println!("Running simulator on: {}", cli.dataset_dir.display());

    let mut config = EngineRunConfig::from_dataset_dir(&cli.dataset_dir)
        .with_merge_rule(cli.merge_rule)
        .with_max_steps(cli.max_steps)
        .with_include_origin(cli.include_origin);
    if let Some(output) = cli.output {
        config = config.with_output_path(output);
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("[{elapsed_precise}] {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = EngineRunner::new(config).with_progress(pb.clone()).run();
    pb.finish_and_clear();

    match result {
        Ok(summary) => {
            println!("Done. Wrote: {}", summary.output_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logger() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}
