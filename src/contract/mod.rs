//! Option contract definitions
//!
//! An [`OptionContract`] can only be obtained through validation, so every value of
//! the type is priceable by the closed form in [`crate::models::bs`].

pub mod record;

pub use record::{validate, RawRecord};

use crate::error::{InvalidOption, InvalidReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Call => "call",
            OptionKind::Put => "put",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKind {
    type Err = InvalidOption;

    /// Case-sensitive: only `"call"` and `"put"` are recognised.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(OptionKind::Call),
            "put" => Ok(OptionKind::Put),
            _ => Err(InvalidOption::new(InvalidReason::UnsupportedKind)),
        }
    }
}

/// Validated, immutable parameter set of a single European option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionContract {
    kind: OptionKind,
    spot: f64,
    strike: f64,
    rate: f64,
    volatility: f64,
    time_to_maturity: f64,
    quantity: u32,
}

impl OptionContract {
    /// Build a contract from an option type string and its numeric parameters.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// kind, volatility, time to maturity, spot/strike, quantity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bsm_batch::{InvalidReason, OptionContract};
    ///
    /// let call = OptionContract::new("call", 1.0, 0.9, 0.015, 0.2, 1.0, 1).unwrap();
    /// assert_eq!(call.strike(), 0.9);
    ///
    /// let err = OptionContract::new("Call", 1.0, 0.9, 0.015, 0.2, 1.0, 1).unwrap_err();
    /// assert_eq!(err.reason, InvalidReason::UnsupportedKind);
    /// ```
    pub fn new(
        kind: &str,
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        time_to_maturity: f64,
        quantity: u32,
    ) -> Result<Self, InvalidOption> {
        let kind = kind.parse::<OptionKind>()?;
        Self::with_kind(
            kind,
            spot,
            strike,
            rate,
            volatility,
            time_to_maturity,
            quantity,
        )
    }

    /// Same as [`OptionContract::new`] for an already typed option kind.
    pub fn with_kind(
        kind: OptionKind,
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        time_to_maturity: f64,
        quantity: u32,
    ) -> Result<Self, InvalidOption> {
        // Negated comparisons so that NaN is rejected too.
        if !(volatility > 0.0) {
            return Err(InvalidOption::new(InvalidReason::NonPositiveVolatility));
        }
        if !(time_to_maturity > 0.0) {
            return Err(InvalidOption::new(InvalidReason::NonPositiveMaturity));
        }
        if !(spot > 0.0 && strike > 0.0) {
            return Err(InvalidOption::new(InvalidReason::NonPositivePrice));
        }
        if quantity == 0 {
            return Err(InvalidOption::new(InvalidReason::NonPositiveQuantity));
        }

        Ok(Self {
            kind,
            spot,
            strike,
            rate,
            volatility,
            time_to_maturity,
            quantity,
        })
    }

    /// Copy of this contract with a different underlying price, re-validated.
    pub fn with_spot(&self, spot: f64) -> Result<Self, InvalidOption> {
        Self::with_kind(
            self.kind,
            spot,
            self.strike,
            self.rate,
            self.volatility,
            self.time_to_maturity,
            self.quantity,
        )
    }

    /// Copy of this contract with a different number of contracts, re-validated.
    pub fn with_quantity(&self, quantity: u32) -> Result<Self, InvalidOption> {
        Self::with_kind(
            self.kind,
            self.spot,
            self.strike,
            self.rate,
            self.volatility,
            self.time_to_maturity,
            quantity,
        )
    }

    /// The same parameters with the opposite option type.
    pub fn counterpart(&self) -> Self {
        let kind = match self.kind {
            OptionKind::Call => OptionKind::Put,
            OptionKind::Put => OptionKind::Call,
        };
        Self { kind, ..*self }
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Current price of the underlying.
    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Continuously-compounded risk-free rate; may be negative.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Unitless year fraction until expiry.
    pub fn time_to_maturity(&self) -> f64 {
        self.time_to_maturity
    }

    /// Number of contracts; scales the unit price linearly.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}
