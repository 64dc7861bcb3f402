//! Error types for contract construction, pricing and batch processing.

use std::fmt;
use thiserror::Error;

/// Why a parameter set was rejected as an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InvalidReason {
    UnsupportedKind,
    NonPositiveVolatility,
    NonPositiveMaturity,
    NonPositivePrice,
    NonPositiveQuantity,
}

impl InvalidReason {
    /// Stable snake_case label, used in logs and batch summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::UnsupportedKind => "unsupported_kind",
            InvalidReason::NonPositiveVolatility => "non_positive_volatility",
            InvalidReason::NonPositiveMaturity => "non_positive_maturity",
            InvalidReason::NonPositivePrice => "non_positive_price",
            InvalidReason::NonPositiveQuantity => "non_positive_quantity",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter set that does not describe a priceable option.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid option: {reason}")]
pub struct InvalidOption {
    pub reason: InvalidReason,
}

impl InvalidOption {
    pub fn new(reason: InvalidReason) -> Self {
        Self { reason }
    }
}

/// Everything that can go wrong between a raw record and its price.
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error(transparent)]
    InvalidOption(#[from] InvalidOption),

    #[error("field `{field}` could not be parsed from {value:?}")]
    Parse { field: &'static str, value: String },

    /// Reached the closed form with inputs that would divide by zero.
    #[error(
        "degenerate pricing inputs: volatility={volatility}, time_to_maturity={time_to_maturity}"
    )]
    ArithmeticDegenerate {
        volatility: f64,
        time_to_maturity: f64,
    },

    /// Generation was asked for a spot jitter outside `[0, 1)`.
    #[error("spot jitter must be finite and in [0, 1), got {spot_jitter}")]
    InvalidVariation { spot_jitter: f64 },

    #[error("record could not be read: {0}")]
    Source(csv::Error),

    #[error("record could not be written: {0}")]
    Sink(csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValuationError {
    /// Label under which this error is counted in a batch summary.
    pub fn reason_label(&self) -> &'static str {
        match self {
            ValuationError::InvalidOption(invalid) => invalid.reason.as_str(),
            ValuationError::Parse { .. } => "parse_error",
            ValuationError::ArithmeticDegenerate { .. } => "arithmetic_degenerate",
            ValuationError::InvalidVariation { .. } => "invalid_variation",
            ValuationError::Source(_) => "source_error",
            ValuationError::Sink(_) => "sink_error",
            ValuationError::Io(_) => "io_error",
        }
    }

    /// The contract rejection reason, if this is a validation failure.
    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self {
            ValuationError::InvalidOption(invalid) => Some(invalid.reason),
            _ => None,
        }
    }
}
