//! RetailForge: retail price prediction CLI
//!
//! This is the main entrypoint that parses arguments, sets up logging and
//! runs the pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use retailforge::{pipeline, Args};
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    if args.verbose {
        println!("RetailForge - Retail Price Prediction");
        println!("=====================================\n");
    }

    let config = args.to_config();
    let start_time = Instant::now();

    let outcome = pipeline::run(&config)
        .with_context(|| format!("pipeline failed for {}", config.input_path.display()))?;

    if args.verbose {
        println!("\n=== Pipeline Complete ===");
        println!(
            "Rows used: {} (train {}, test {})",
            outcome.cleaned_rows, outcome.n_train, outcome.n_test
        );
        for plot in &outcome.plots {
            println!("Figure saved to: {}", plot.display());
        }
        println!(
            "Total processing time: {:.2}s",
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
