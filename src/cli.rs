use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "kvresolve",
    version,
    about = "Key-value pair reconstruction for document analysis output"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Inventory(InventoryArgs),
    Stats(StatsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// An analysis JSON file, or a directory scanned for `*_analysis.json`.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = "analysis_output")]
    pub output_dir: PathBuf,

    /// JSON file overriding any subset of the analysis settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub low_confidence_threshold: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub no_csv: bool,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".")]
    pub source_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long)]
    pub input: PathBuf,
}
