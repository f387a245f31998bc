//! Conversion between human-entered stakes in native currency units and the
//! ledger's minimal integer unit (10^18 per native unit).

use crate::error::{CoreError, Result};
use ethers::types::U256;

pub const LEDGER_DECIMALS: usize = 18;

fn scale() -> U256 {
    U256::exp10(LEDGER_DECIMALS)
}

/// Parse a positive decimal amount (e.g. `"0.01"`) into minimal ledger units.
///
/// Only plain decimal notation is accepted: no sign, exponent, or special
/// values. Trailing zeros past the 18th fractional digit are allowed, any other
/// digit there is rejected rather than truncated.
pub fn to_ledger_units(amount: &str) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation("amount is empty"));
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(CoreError::validation(format!(
            "'{}' is not a decimal amount",
            trimmed
        )));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > LEDGER_DECIMALS {
        return Err(CoreError::validation(format!(
            "'{}' has more than {} decimal places",
            trimmed, LEDGER_DECIMALS
        )));
    }

    let overflow = || CoreError::validation(format!("'{}' is too large", trimmed));

    let whole_units = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| overflow())?
    };
    let fraction_units = if fraction.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(fraction).map_err(|_| overflow())?
            * U256::exp10(LEDGER_DECIMALS - fraction.len())
    };

    let total = whole_units
        .checked_mul(scale())
        .and_then(|units| units.checked_add(fraction_units))
        .ok_or_else(overflow)?;

    if total.is_zero() {
        return Err(CoreError::validation("amount must be greater than zero"));
    }

    Ok(total)
}

/// Render minimal ledger units as a decimal amount without trailing zeros.
pub fn from_ledger_units(units: U256) -> String {
    let (whole, fraction) = units.div_mod(scale());
    if fraction.is_zero() {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", fraction.to_string(), width = LEDGER_DECIMALS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
