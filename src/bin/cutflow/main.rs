mod cli;
mod progress;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    // --- Configuration -------------------------------------------------------------
    let config = match &args.config {
        Some(path) => read_config_file(path)?,
        None       => Config::default(),
    };
    info!(jet_algorithm = %config.jet_algorithm, triggers = ?config.triggers, "configuration");
    let settings = ToySettings {
        is_simulation: !args.data,
        jet_algorithm: config.jet_algorithm.clone(),
        trigger      : config.triggers.first().cloned().unwrap_or_else(|| ToySettings::default().trigger),
        ..ToySettings::default()
    };
    let analysis = Analysis::new(config, Tools::default()).with_seed(args.seed);

    // --- Process events in batches -------------------------------------------------
    let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads).build()?;
    let progress = Progress::new(args.events)?;
    let mut generator = ToyGenerator::new(settings, args.seed);
    let mut summary = analysis.new_summary();
    let mut remaining = args.events;
    while remaining > 0 {
        let n = remaining.min(args.batch.max(1));
        let events = generator.events(n);
        let batch = pool.install(|| analysis.run_parallel(&events, args.job_size));
        summary += &batch;
        progress.batch_done(n, &summary);
        remaining -= n;
    }
    progress.finish();

    // --- Report --------------------------------------------------------------------
    summary.report();
    println!("{}", summary.cutflow);
    println!("{} events filled into histograms", group_digits(summary.histograms.entries()));
    Ok(())
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use clap::Parser;
use tracing::info;
use cli::Cli;
use progress::Progress;
use vbfinv::{
    config::{read_config_file, Config},
    cutflow::group_digits,
    toy::{ToyGenerator, ToySettings},
    tools::Tools,
    Analysis,
};
