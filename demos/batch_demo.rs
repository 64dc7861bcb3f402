// demos/batch_demo.rs

//! Generate a CSV file of option records, then value it as a streaming batch.
//!
//! Usage: `cargo run --release --example batch_demo [config.toml]`
//!
//! Without a config file, one million identical reference calls are written to
//! `option_examples.csv` and valued back.

use anyhow::Result;
use bsm_batch::{generate_csv, price, run_csv_batch, BatchConfig};
use std::time::Instant;
use tracing::{info, Level};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = match std::env::args().nth(1) {
        Some(path) => BatchConfig::from_path(path)?,
        None => BatchConfig::default(),
    };

    let started = Instant::now();
    let written = generate_csv(&config)?;
    info!(
        written,
        path = %config.input.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "records generated"
    );

    let started = Instant::now();
    let summary = run_csv_batch(&config)?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "valuation finished: {summary}"
    );

    let template = config.generation.template.to_contract()?;
    info!(
        "template value {:.17} (every row matches when spot_jitter = 0)",
        price(&template)?
    );

    Ok(())
}
