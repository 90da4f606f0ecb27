use super::provider_format::{format_date, format_time, parse_date, parse_time};
use super::{CreateTransactionPayload, CreateTransactionRequest, ParsedTransaction, RequestError};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

fn sample_request() -> serde_json::Value {
    json!({
        "trxId": "DA72U4603O",
        "provider": "bKash",
        "amount": 380.0,
        "senderNumber": "01831638032",
        "balance": 508.03,
        "transactionDate": "07/01/2026",
        "transactionTime": "19:06",
        "rawSms": "You have received Tk 380.00 from 01831638032."
    })
}

#[test]
fn test_provider_dates_and_times_parse_and_format() -> Result<()> {
    let date = parse_date("07/01/2026").ok_or_else(|| anyhow!("date rejected"))?;
    let time = parse_time("19:06").ok_or_else(|| anyhow!("time rejected"))?;

    assert_eq!((date.day(), date.month(), date.year()), (7, 1, 2026));
    assert_eq!((time.hour(), time.minute()), (19, 6));
    assert_eq!(format_date(date), "07/01/2026");
    assert_eq!(format_time(time), "19:06");

    Ok(())
}

#[test]
fn test_provider_dates_and_times_reject_malformed_values() {
    assert!(parse_date("31/02/2026").is_none());
    assert!(parse_date("7/1/2026").is_none());
    assert!(parse_date("07/13/2026").is_none());
    assert!(parse_date("07/01/2026/1").is_none());
    assert!(parse_time("24:00").is_none());
    assert!(parse_time("19:6").is_none());
    assert!(parse_time("19:60").is_none());
}

#[test]
fn test_request_converts_into_parsed_transaction() -> Result<()> {
    let request: CreateTransactionRequest = serde_json::from_value(sample_request())?;
    let parsed = ParsedTransaction::try_from(request)?;

    assert_eq!(parsed.external_id, "DA72U4603O");
    assert_eq!(parsed.amount.to_string(), "380.00");
    assert_eq!(parsed.balance.to_string(), "508.03");
    assert_eq!(format_date(parsed.transaction_date), "07/01/2026");

    Ok(())
}

#[test]
fn test_request_reports_every_missing_or_empty_field() -> Result<()> {
    let mut body = sample_request();
    body["trxId"] = json!("");
    body.as_object_mut().ok_or_else(|| anyhow!("not an object"))?.remove("balance");

    let request: CreateTransactionRequest = serde_json::from_value(body)?;
    let result = ParsedTransaction::try_from(request);

    assert_eq!(result, Err(RequestError::MissingFields(vec!["trxId", "balance"])));

    Ok(())
}

#[test]
fn test_request_rejects_unparseable_date() -> Result<()> {
    let mut body = sample_request();
    body["transactionDate"] = json!("2026-01-07");

    let request: CreateTransactionRequest = serde_json::from_value(body)?;

    assert_eq!(ParsedTransaction::try_from(request), Err(RequestError::InvalidField("transactionDate")));

    Ok(())
}

#[test]
fn test_payload_serializes_in_wire_shape() -> Result<()> {
    let request: CreateTransactionRequest = serde_json::from_value(sample_request())?;
    let parsed = ParsedTransaction::try_from(request)?;
    let payload = CreateTransactionPayload::from(&parsed);
    let value = serde_json::to_value(&payload)?;

    assert_eq!(value["trxId"], json!("DA72U4603O"));
    assert_eq!(value["senderNumber"], json!("01831638032"));
    assert_eq!(value["transactionDate"], json!("07/01/2026"));
    assert_eq!(value["transactionTime"], json!("19:06"));
    assert_eq!(value["balance"].as_f64(), Some(508.03));
    assert_eq!(payload.amount, Decimal::from_str("380.00")?);

    Ok(())
}

#[test]
fn test_request_rejects_zero_or_negative_amount() -> Result<()> {
    for amount in [json!(0.0), json!(-5.25)] {
        let mut body = sample_request();
        body["amount"] = amount;

        let request: CreateTransactionRequest = serde_json::from_value(body)?;

        assert_eq!(ParsedTransaction::try_from(request), Err(RequestError::InvalidField("amount")));
    }

    Ok(())
}
