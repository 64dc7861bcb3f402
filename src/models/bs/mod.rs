// Black-Scholes-Merton closed form for European calls and puts, together with the
// standard normal CDF it is built on. Greeks and implied volatility are out of
// scope for this crate.

use crate::contract::{OptionContract, OptionKind};
use crate::error::ValuationError;
use serde::{Deserialize, Serialize};

/// Standard normal cumulative distribution function.
///
/// Evaluated as `0.5 * erfc(-x / sqrt(2))`, which keeps full relative precision
/// in the lower tail where `1 + erf(..)` would cancel.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * libm::erfc(-x / std::f64::consts::SQRT_2)
}

/// Which normal probability weights the discounted strike in the put formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutLeg {
    /// `K·e^(−rT)·Φ(−d2) − S·Φ(−d1)`: the textbook put, consistent with
    /// put-call parity.
    #[default]
    NegD2,
    /// `K·e^(−rT)·Φ(d2) − S·Φ(−d1)`: reproduces historical reference figures
    /// that were produced with this form. Not parity-consistent.
    PosD2,
}

/// The `(d1, d2)` pair of the closed form.
#[allow(non_snake_case)]
pub fn d1_d2(S: f64, K: f64, r: f64, sigma: f64, T: f64) -> (f64, f64) {
    let log_moneyness = (S / K).ln();
    let half_variance = sigma.powi(2) / 2.0;
    let denominator = sigma * T.sqrt();
    let d1 = (log_moneyness + (r + half_variance) * T) / denominator;
    let d2 = (log_moneyness + (r - half_variance) * T) / denominator;
    (d1, d2)
}

/// Price of one European option under Black-Scholes-Merton assumptions.
///
/// Unlike [`price`], this takes unvalidated inputs and therefore guards the
/// divisions by `sigma * sqrt(T)`: a non-positive or non-finite `sigma`/`T`, or a
/// non-finite result, is reported as [`ValuationError::ArithmeticDegenerate`].
#[allow(non_snake_case)]
pub fn black_scholes_unit_price(
    kind: OptionKind,
    S: f64,
    K: f64,
    r: f64,
    sigma: f64,
    T: f64,
    put_leg: PutLeg,
) -> Result<f64, ValuationError> {
    let degenerate = || ValuationError::ArithmeticDegenerate {
        volatility: sigma,
        time_to_maturity: T,
    };

    if !(sigma > 0.0 && sigma.is_finite() && T > 0.0 && T.is_finite()) {
        return Err(degenerate());
    }

    let (d1, d2) = d1_d2(S, K, r, sigma, T);
    let discounted_strike = K * (-r * T).exp();

    let value = match (kind, put_leg) {
        (OptionKind::Call, _) => S * norm_cdf(d1) - discounted_strike * norm_cdf(d2),
        (OptionKind::Put, PutLeg::NegD2) => {
            -S * norm_cdf(-d1) + discounted_strike * norm_cdf(-d2)
        }
        (OptionKind::Put, PutLeg::PosD2) => {
            -S * norm_cdf(-d1) + discounted_strike * norm_cdf(d2)
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(degenerate())
    }
}

/// Fair value of a contract position: unit price times quantity.
///
/// Uses the parity-consistent put ([`PutLeg::NegD2`]): the reference put (spot 1,
/// strike 0.9, rate 0.015, volatility 0.2, one year) is 0.031586061075602856 here.
/// The historical figure 0.3722123939103649 for that put is only reproduced by
/// [`PutLeg::PosD2`] through [`price_with`]. Calls are the same under both legs.
///
/// Returns [`ValuationError::ArithmeticDegenerate`] if the position value is not
/// finite, e.g. a huge spot times a huge quantity.
///
/// # Example
///
/// ```rust
/// use bsm_batch::{price, price_with, OptionContract, PutLeg};
///
/// let call = OptionContract::new("call", 1.0, 0.9, 0.015, 0.2, 1.0, 1).unwrap();
/// let value = price(&call).unwrap();
/// assert!((value - 0.14498531543284665).abs() < 1e-12);
///
/// let put = call.counterpart();
/// assert!((price(&put).unwrap() - 0.031586061075602856).abs() < 1e-12);
/// assert!((price_with(&put, PutLeg::PosD2).unwrap() - 0.3722123939103649).abs() < 1e-12);
/// ```
pub fn price(contract: &OptionContract) -> Result<f64, ValuationError> {
    price_with(contract, PutLeg::default())
}

/// [`price`] with an explicit choice of put formula.
pub fn price_with(contract: &OptionContract, put_leg: PutLeg) -> Result<f64, ValuationError> {
    let unit = black_scholes_unit_price(
        contract.kind(),
        contract.spot(),
        contract.strike(),
        contract.rate(),
        contract.volatility(),
        contract.time_to_maturity(),
        put_leg,
    )?;

    let value = unit * f64::from(contract.quantity());
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValuationError::ArithmeticDegenerate {
            volatility: contract.volatility(),
            time_to_maturity: contract.time_to_maturity(),
        })
    }
}
