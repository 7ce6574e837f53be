/// Command line interface for `cutflow` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "cutflow",
    about = "Run the VBF invisible selection over toy events and print the cutflow",
)]
pub (super) struct Cli {
    /// TOML analysis configuration. Built-in defaults if absent
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Number of toy events to generate and process
    #[clap(short = 'n', long, default_value = "100000")]
    pub events: usize,

    /// Seed of the toy event generator
    #[clap(short, long, default_value = "1")]
    pub seed: u64,

    /// Generate data-like events rather than simulation
    #[clap(long)]
    pub data: bool,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long, default_value = "4")]
    pub threads: usize,

    /// Events generated, and then processed in parallel, at a time
    #[clap(long, default_value = "10000")]
    pub batch: usize,

    /// Events accumulated by a rayon worker before merging
    #[clap(long, default_value = "500")]
    pub job_size: usize,

    /// Verbosity of the log written to stderr
    #[clap(short, long, default_value = "info")]
    pub log_level: Level,
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::path::PathBuf;
use tracing::Level;
