use std::sync::LazyLock;

use jiff::civil::{Date, Time};
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::{provider_format, ParsedTransaction, RawNotification};
use crate::parser::errors::{Field, ParseFailure};
use crate::types::{parse_money, PROVIDER};

const SENDER_TOKEN: &str = "bkash";
const TRANSACTION_MARKER: &str = "trxid";

//NOTE: One pattern per field. If the provider changes one segment of the message only that
//      field goes missing, which is far easier to diagnose than a single pattern that stops matching.
pub(super) static AMOUNT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)received\s+Tk\s+([\d,]+\.?\d*)"));
pub(super) static SENDER_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)from\s+(\d+)"));
pub(super) static BALANCE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)Balance\s+Tk\s+([\d,]+\.?\d*)"));
pub(super) static EXTERNAL_ID: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)TrxID\s+([A-Za-z0-9]+)"));
pub(super) static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bat\s+(\d{2}/\d{2}/\d{4})\s+(\d{2}:\d{2})"));

//NOTE: Patterns are constants, so a failure here is a programming error caught by the parser tests.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static parser pattern must compile")
}

/// Cheap pre-filter: is this a provider message that carries a transaction id at all?
pub fn is_eligible(sender: &str, body: &str) -> bool {
    sender.to_lowercase().contains(SENDER_TOKEN) && body.to_lowercase().contains(TRANSACTION_MARKER)
}

pub fn parse_notification(notification: &RawNotification) -> Result<ParsedTransaction, ParseFailure> {
    parse(&notification.sender, &notification.body)
}

/// Turns a raw SMS into a transaction record.
///
/// The result depends only on `sender` and `body`, so replaying the same
/// message always yields the same record or the same failure.
///
/// # Errors
/// - `NotApplicable` if the message is not a provider transaction message.
/// - `MissingField` naming the first field, in record order, that could not be extracted.
/// - `InvalidRecord` if every field was extracted but the record is unusable.
pub fn parse(sender: &str, body: &str) -> Result<ParsedTransaction, ParseFailure> {
    if !is_eligible(sender, body) {
        return Err(ParseFailure::NotApplicable);
    }

    let amount = extract_amount(body)?;
    let sender_number = extract_sender_number(body)?;
    let balance = extract_balance(body)?;
    let external_id = extract_external_id(body)?;
    let (transaction_date, transaction_time) = extract_date_time(body)?;

    if external_id.trim().is_empty() {
        return Err(ParseFailure::InvalidRecord("transaction id is empty".to_string()));
    }

    if amount.is_zero() {
        return Err(ParseFailure::InvalidRecord(format!("transaction [{external_id}] has a zero amount")));
    }

    Ok(ParsedTransaction {
        provider: PROVIDER.to_string(),
        amount,
        sender_number,
        external_id,
        transaction_date,
        transaction_time,
        balance,
        raw_sms: body.to_string()
    })
}

pub fn extract_amount(body: &str) -> Result<Decimal, ParseFailure> {
    capture(&AMOUNT, body)
        .and_then(|value| parse_money(value).ok())
        .ok_or(ParseFailure::MissingField(Field::Amount))
}

pub fn extract_sender_number(body: &str) -> Result<String, ParseFailure> {
    capture(&SENDER_NUMBER, body)
        .map(str::to_string)
        .ok_or(ParseFailure::MissingField(Field::SenderNumber))
}

pub fn extract_balance(body: &str) -> Result<Decimal, ParseFailure> {
    capture(&BALANCE, body)
        .and_then(|value| parse_money(value).ok())
        .ok_or(ParseFailure::MissingField(Field::Balance))
}

pub fn extract_external_id(body: &str) -> Result<String, ParseFailure> {
    capture(&EXTERNAL_ID, body)
        .map(str::to_string)
        .ok_or(ParseFailure::MissingField(Field::ExternalId))
}

pub fn extract_date_time(body: &str) -> Result<(Date, Time), ParseFailure> {
    let missing = ParseFailure::MissingField(Field::DateTime);
    let captures = DATE_TIME.captures(body).ok_or_else(|| missing.clone())?;

    let date = captures.get(1).and_then(|value| provider_format::parse_date(value.as_str()));
    let time = captures.get(2).and_then(|value| provider_format::parse_time(value.as_str()));

    match (date, time) {
        (Some(date), Some(time)) => Ok((date, time)),
        _ => Err(missing)
    }
}

fn capture<'a>(pattern: &Regex, body: &'a str) -> Option<&'a str> {
    pattern.captures(body)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str())
}
