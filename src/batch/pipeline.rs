use super::io::RecordSink;
use super::types::{BatchSummary, Valuation, ValuationResult};
use crate::contract::{validate, OptionContract, RawRecord};
use crate::error::ValuationError;
use crate::models::bs::{price_with, PutLeg};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cooperative stop signal, checked between records. Clones share the flag, so it
/// can be raised from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parse, validate and price a single raw record.
pub fn value_record(raw: &RawRecord, put_leg: PutLeg) -> Result<Valuation, ValuationError> {
    let contract = validate(raw)?;
    let price = price_with(&contract, put_leg)?;
    Ok(Valuation { contract, price })
}

/// Lazy valuation of a record stream, one [`ValuationResult`] per input record in
/// input order.
///
/// Only the record currently being priced is held in memory. Failures are returned
/// as error results and never end the stream; the running [`BatchSummary`] is
/// available at any point and is logged once the source is exhausted.
pub struct Valuations<I> {
    source: I,
    put_leg: PutLeg,
    next_row: usize,
    progress_interval: usize,
    cancellation: Option<CancellationFlag>,
    summary: BatchSummary,
    finished: bool,
}

impl<I> Valuations<I>
where
    I: Iterator<Item = Result<RawRecord, ValuationError>>,
{
    pub fn new(source: I) -> Self {
        Self {
            source,
            put_leg: PutLeg::default(),
            next_row: 0,
            progress_interval: 0,
            cancellation: None,
            summary: BatchSummary::default(),
            finished: false,
        }
    }

    pub fn with_put_leg(mut self, put_leg: PutLeg) -> Self {
        self.put_leg = put_leg;
        self
    }

    /// Log progress at debug level every `interval` rows; `0` disables it.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Stop before the next record once `flag` is raised.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    /// Drain the remaining records, discarding results, and return the summary.
    pub fn into_summary(mut self) -> BatchSummary {
        self.by_ref().for_each(drop);
        self.summary
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }
}

impl<I> Iterator for Valuations<I>
where
    I: Iterator<Item = Result<RawRecord, ValuationError>>,
{
    type Item = ValuationResult;

    fn next(&mut self) -> Option<ValuationResult> {
        if self.finished {
            return None;
        }
        if self.is_cancelled() {
            self.finished = true;
            warn!(rows = self.summary.total, "batch cancelled: {}", self.summary);
            return None;
        }

        let Some(item) = self.source.next() else {
            self.finished = true;
            info!("batch complete: {}", self.summary);
            return None;
        };

        let row = self.next_row;
        self.next_row += 1;

        let outcome = item.and_then(|raw| value_record(&raw, self.put_leg));
        if let Err(err) = &outcome {
            warn!(row, reason = err.reason_label(), "row rejected: {err}");
        }

        let result = ValuationResult { row, outcome };
        self.summary.record(&result);

        if self.progress_interval > 0 && self.next_row % self.progress_interval == 0 {
            debug!(
                rows = self.next_row,
                failed = self.summary.failed(),
                "batch progress"
            );
        }

        Some(result)
    }
}

/// Value every record of `source` lazily.
///
/// # Example
///
/// ```rust
/// use bsm_batch::{run_batch, OptionContract, RawRecord};
///
/// let call = OptionContract::new("call", 1.0, 0.9, 0.015, 0.2, 1.0, 1).unwrap();
/// let mut bond = RawRecord::from(&call);
/// bond.option_type = "bond".to_string();
///
/// let records = vec![RawRecord::from(&call), bond];
/// let results: Vec<_> = run_batch(records.into_iter().map(Ok)).collect();
///
/// assert!(results[0].is_ok());
/// assert_eq!(results[1].row, 1);
/// assert_eq!(results[1].error().unwrap().reason_label(), "unsupported_kind");
/// ```
pub fn run_batch<S>(source: S) -> Valuations<S::IntoIter>
where
    S: IntoIterator<Item = Result<RawRecord, ValuationError>>,
{
    Valuations::new(source.into_iter())
}

/// How generated records deviate from their template.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Variation {
    /// Spot is multiplied by a uniform factor in `[1 - spot_jitter, 1 + spot_jitter]`.
    /// Zero writes identical copies of the template. Must be finite and below 1.
    pub spot_jitter: f64,
    /// Fixed seed for reproducible output; entropy-seeded when `None`.
    pub seed: Option<u64>,
}

impl Variation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn spot_jitter(spot_jitter: f64, seed: Option<u64>) -> Self {
        Self { spot_jitter, seed }
    }

    /// Reject a jitter that is negative, NaN, infinite or at least 1, any of which
    /// would sample an unusable factor range or a non-positive spot.
    pub fn validate(&self) -> Result<(), ValuationError> {
        let j = self.spot_jitter;
        if j.is_finite() && (0.0..1.0).contains(&j) {
            Ok(())
        } else {
            Err(ValuationError::InvalidVariation { spot_jitter: j })
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn apply(
        &self,
        template: &OptionContract,
        rng: &mut StdRng,
    ) -> Result<OptionContract, ValuationError> {
        if self.spot_jitter == 0.0 {
            return Ok(*template);
        }
        let factor = rng.gen_range(1.0 - self.spot_jitter..=1.0 + self.spot_jitter);
        Ok(template.with_spot(template.spot() * factor)?)
    }
}

/// Write `count` records derived from `template` into `sink`, one at a time, then
/// finish the sink. Returns the number of records written.
///
/// The variation is checked before anything is written: a jitter outside `[0, 1)`
/// fails with [`ValuationError::InvalidVariation`] and leaves the sink untouched.
pub fn generate<S>(
    template: &OptionContract,
    count: usize,
    variation: &Variation,
    sink: &mut S,
) -> Result<usize, ValuationError>
where
    S: RecordSink + ?Sized,
{
    variation.validate()?;

    let mut rng = variation.rng();
    for _ in 0..count {
        let contract = variation.apply(template, &mut rng)?;
        sink.write_record(&RawRecord::from(&contract))?;
    }
    sink.finish()?;

    info!(
        count,
        kind = %template.kind(),
        spot_jitter = variation.spot_jitter,
        "generated option records"
    );
    Ok(count)
}
