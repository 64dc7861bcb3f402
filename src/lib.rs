//! # bsm-batch: European Option Valuation at Batch Scale
//!
//! `bsm-batch` prices European vanilla options with the Black-Scholes-Merton closed
//! form and applies that valuation to large tabular datasets, record by record,
//! without ever materialising the whole input or output.
//!
//! ## Core Features
//!
//! - **Validated contracts**: [`OptionContract`] can only be built from a parameter set
//!   the closed form can price; rejections carry an [`InvalidReason`]
//! - **Closed-form pricing**: [`price`] on top of an `erfc`-based standard normal CDF
//! - **Streaming batches**: [`run_batch`] turns any record stream into a lazy stream of
//!   per-row [`ValuationResult`]s in input order, with a running [`BatchSummary`]
//! - **Record generation**: [`generate`] writes synthetic records into any [`RecordSink`]
//!
//! ## Quick Start
//!
//! ```rust
//! use bsm_batch::{generate, price, run_batch, OptionContract, RawRecord, Variation};
//!
//! let call = OptionContract::new("call", 1.0, 0.9, 0.015, 0.2, 1.0, 1)?;
//! let direct = price(&call)?;
//!
//! // Write a few copies and value them back
//! let mut records: Vec<RawRecord> = Vec::new();
//! generate(&call, 3, &Variation::none(), &mut records)?;
//!
//! for result in run_batch(records.into_iter().map(Ok)) {
//!     assert_eq!(result.price(), Some(direct));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## CSV Files
//!
//! [`CsvRecordSource`] and [`CsvRecordSink`] read and write header-labeled files with the
//! columns `option_type, price, strike, interest_rate, volatility, time_to_maturity,
//! amount_underlying`. [`run_csv_batch`] and [`generate_csv`] drive both from a
//! [`BatchConfig`].

// ================================================================================================
// MODULES
// ================================================================================================

pub mod batch;
pub mod config;
pub mod contract;
pub mod error;
pub mod models;

// ================================================================================================
// IMPORTS
// ================================================================================================

use anyhow::{Context, Result};
use tracing::info;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Contracts and their tabular form
pub use contract::{validate, OptionContract, OptionKind, RawRecord};

// Errors
pub use error::{InvalidOption, InvalidReason, ValuationError};

// Valuation engine
pub use models::bs::{black_scholes_unit_price, norm_cdf, price, price_with, PutLeg};

// Batch pipeline
pub use batch::{
    generate, run_batch, BatchSummary, CancellationFlag, CsvRecordSink, CsvRecordSource,
    RecordSink, ResultWriter, Valuation, ValuationResult, Valuations, Variation,
};

// Configuration
pub use config::{BatchConfig, GenerationConfig, TemplateConfig};

// ================================================================================================
// CSV DRIVERS
// ================================================================================================

/// Value every record of `config.input`, streaming per-row results to
/// `config.output` when set, and return the end-of-run summary.
///
/// Row-level failures are counted in the summary; only failures to open, read the
/// header of, or write files end the run early.
pub fn run_csv_batch(config: &BatchConfig) -> Result<BatchSummary> {
    info!(input = %config.input.display(), put_leg = ?config.put_leg, "starting batch valuation");

    let source = CsvRecordSource::from_path(&config.input)
        .with_context(|| format!("failed to open {}", config.input.display()))?;
    let mut valuations = run_batch(source)
        .with_put_leg(config.put_leg)
        .with_progress_interval(config.progress_interval);

    match &config.output {
        Some(path) => {
            let mut writer = ResultWriter::to_path(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            for result in valuations.by_ref() {
                writer.write(&result)?;
            }
            writer.finish()?;
            Ok(valuations.summary().clone())
        }
        None => Ok(valuations.into_summary()),
    }
}

/// Write `config.generation.count` records built from the configured template into
/// `config.input`. Returns the number of records written.
pub fn generate_csv(config: &BatchConfig) -> Result<usize> {
    let generation = &config.generation;
    let template = generation
        .template
        .to_contract()
        .context("invalid generation template")?;
    let variation = generation.variation();
    variation.validate().context("invalid generation variation")?;

    let mut sink = CsvRecordSink::to_path(&config.input)
        .with_context(|| format!("failed to create {}", config.input.display()))?;
    let written = generate(
        &template,
        generation.count,
        &variation,
        &mut sink,
    )?;
    Ok(written)
}
