use crate::contract::OptionContract;
use crate::error::ValuationError;
use std::collections::BTreeMap;
use std::fmt;

/// A successfully priced record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub contract: OptionContract,
    /// Fair value of the whole position (unit price times quantity)
    pub price: f64,
}

/// Outcome of one input record, tagged with its 0-based position in the stream.
#[derive(Debug)]
pub struct ValuationResult {
    pub row: usize,
    pub outcome: Result<Valuation, ValuationError>,
}

impl ValuationResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn price(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|valuation| valuation.price)
    }

    pub fn error(&self) -> Option<&ValuationError> {
        self.outcome.as_ref().err()
    }
}

/// Running per-batch counts of successes and failures by reason label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Failure counts keyed by [`ValuationError::reason_label`]
    pub failures: BTreeMap<&'static str, usize>,
}

impl BatchSummary {
    pub fn record(&mut self, result: &ValuationResult) {
        self.total += 1;
        match &result.outcome {
            Ok(_) => self.succeeded += 1,
            Err(err) => *self.failures.entry(err.reason_label()).or_insert(0) += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Number of failures counted under `label`, zero when none occurred.
    pub fn failures_for(&self, label: &str) -> usize {
        self.failures.get(label).copied().unwrap_or(0)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} priced, {} failed",
            self.total,
            self.succeeded,
            self.failed()
        )?;
        for (label, count) in &self.failures {
            write!(f, ", {label}={count}")?;
        }
        Ok(())
    }
}
