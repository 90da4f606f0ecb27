use super::{format_money, parse_money, MoneyError};
use anyhow::Result;
use rust_decimal::Decimal;
use std::str::FromStr;

#[test]
fn test_money_successfully_parses_provider_amounts() -> Result<()> {
    let test_cases = vec![
        ("380.00", "380.00"),
        ("508.03", "508.03"),
        ("1,250.5", "1250.50"),
        ("12,34,567.89", "1234567.89"),
        ("  42  ", "42.00"),
        ("0.00", "0.00"),
    ];

    for (input_string, expected_output) in test_cases {
        assert_eq!(parse_money(input_string)?.to_string(), expected_output);
    }

    Ok(())
}

#[test]
fn test_money_fails_to_parse_invalid_amounts() {
    assert!(matches!(parse_money(""), Err(MoneyError::InvalidFormat(_))));
    assert!(matches!(parse_money(",,,"), Err(MoneyError::InvalidFormat(_))));
    assert!(matches!(parse_money("abc"), Err(MoneyError::InvalidFormat(_))));
    assert!(matches!(parse_money("1.2.3"), Err(MoneyError::InvalidFormat(_))));
    assert!(matches!(parse_money(".5"), Err(MoneyError::InvalidFormat(_))));
    assert_eq!(parse_money("1.005"), Err(MoneyError::TooPrecise(2)));
    assert_eq!(parse_money("-1.00"), Err(MoneyError::Negative));
}

#[test]
fn test_format_money_normalizes_scale() -> Result<()> {
    assert_eq!(format_money(Decimal::from_str("380")?).to_string(), "380.00");
    assert_eq!(format_money(Decimal::from_str("508.035")?).to_string(), "508.04");
    assert_eq!(format_money(Decimal::from_str("0.1")?).to_string(), "0.10");

    Ok(())
}
