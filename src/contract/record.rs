//! Tabular representation of a contract and its parsing into a validated one.

use super::OptionContract;
use crate::error::ValuationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One row of an option table, every field kept as it was read.
///
/// Column names follow the on-disk header: `price` is the spot of the underlying,
/// `interest_rate` the risk-free rate and `amount_underlying` the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub option_type: String,
    pub price: String,
    pub strike: String,
    pub interest_rate: String,
    pub volatility: String,
    pub time_to_maturity: String,
    pub amount_underlying: String,
}

impl From<&OptionContract> for RawRecord {
    /// `f64`'s `Display` is the shortest string that parses back to the same bits,
    /// so written records re-read into identical contracts.
    fn from(contract: &OptionContract) -> Self {
        Self {
            option_type: contract.kind().to_string(),
            price: contract.spot().to_string(),
            strike: contract.strike().to_string(),
            interest_rate: contract.rate().to_string(),
            volatility: contract.volatility().to_string(),
            time_to_maturity: contract.time_to_maturity().to_string(),
            amount_underlying: contract.quantity().to_string(),
        }
    }
}

/// Parse a finite real number; `inf` and `NaN` spellings are not valid inputs.
fn parse_real(field: &'static str, value: &str) -> Result<f64, ValuationError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(parse_error(field, value)),
    }
}

fn parse_integer<T: FromStr>(field: &'static str, value: &str) -> Result<T, ValuationError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| parse_error(field, value))
}

fn parse_error(field: &'static str, value: &str) -> ValuationError {
    ValuationError::Parse {
        field,
        value: value.to_string(),
    }
}

/// Turn a raw record into a validated contract.
///
/// Numeric fields are converted first, in column order, and the first field that
/// does not convert is reported. The converted values then go through
/// [`OptionContract::new`], whose rejections surface as
/// [`ValuationError::InvalidOption`].
pub fn validate(raw: &RawRecord) -> Result<OptionContract, ValuationError> {
    let spot = parse_real("price", &raw.price)?;
    let strike = parse_real("strike", &raw.strike)?;
    let rate = parse_real("interest_rate", &raw.interest_rate)?;
    let volatility = parse_real("volatility", &raw.volatility)?;
    let time_to_maturity = parse_real("time_to_maturity", &raw.time_to_maturity)?;
    let quantity = parse_integer::<u32>("amount_underlying", &raw.amount_underlying)?;

    Ok(OptionContract::new(
        &raw.option_type,
        spot,
        strike,
        rate,
        volatility,
        time_to_maturity,
        quantity,
    )?)
}
