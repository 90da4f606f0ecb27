use crate::types::errors::MoneyError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Every stored monetary value carries exactly this many fractional digits.
pub const MONEY_SCALE: u32 = 2;

/// Parses a provider formatted amount such as `1,250.5` into a two digit decimal.
///
/// Thousands separators are stripped before parsing. Values with more than
/// [`MONEY_SCALE`] fractional digits or a sign are rejected rather than rounded.
pub fn parse_money(value: &str) -> Result<Decimal, MoneyError> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();

    if cleaned.is_empty() {
        return Err(MoneyError::InvalidFormat("Value is an empty string".to_string()));
    }

    if cleaned.starts_with('-') {
        return Err(MoneyError::Negative);
    }

    if !cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!("Value [{cleaned}] does not start with a digit")));
    }

    let mut amount = Decimal::from_str(&cleaned).map_err(|error| {
        MoneyError::InvalidFormat(format!("Value [{cleaned}] is not a decimal: {error}"))
    })?;

    if amount.scale() > MONEY_SCALE {
        return Err(MoneyError::TooPrecise(MONEY_SCALE));
    }

    amount.rescale(MONEY_SCALE);

    Ok(amount)
}

/// Normalizes any decimal to the stored precision, rounding half away from zero.
pub fn format_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}
