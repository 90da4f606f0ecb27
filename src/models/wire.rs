use jiff::civil::{Date, Time};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::errors::RequestError;
use crate::models::{provider_format, ParsedTransaction};
use crate::types::format_money;

/// Body of a create request as sent by the ingestion client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionPayload {
    pub trx_id: String,
    pub provider: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub sender_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(with = "provider_format::date")]
    pub transaction_date: Date,
    #[serde(with = "provider_format::time")]
    pub transaction_time: Time,
    pub raw_sms: String
}

impl From<&ParsedTransaction> for CreateTransactionPayload {
    fn from(parsed: &ParsedTransaction) -> Self {
        Self {
            trx_id: parsed.external_id.clone(),
            provider: parsed.provider.clone(),
            amount: parsed.amount,
            sender_number: parsed.sender_number.clone(),
            balance: parsed.balance,
            transaction_date: parsed.transaction_date,
            transaction_time: parsed.transaction_time,
            raw_sms: parsed.raw_sms.clone()
        }
    }
}

/// Body of a create request as received by the store boundary.
///
/// Every field is optional here so that a request missing several fields can
/// be reported as one client error instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub trx_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub sender_number: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub transaction_time: Option<String>,
    #[serde(default)]
    pub raw_sms: Option<String>
}

impl TryFrom<CreateTransactionRequest> for ParsedTransaction {
    type Error = RequestError;

    fn try_from(request: CreateTransactionRequest) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();

        let trx_id = required_text(request.trx_id, "trxId", &mut missing);
        let provider = required_text(request.provider, "provider", &mut missing);
        let sender_number = required_text(request.sender_number, "senderNumber", &mut missing);
        let transaction_date = required_text(request.transaction_date, "transactionDate", &mut missing);
        let transaction_time = required_text(request.transaction_time, "transactionTime", &mut missing);
        let raw_sms = required_text(request.raw_sms, "rawSms", &mut missing);

        if request.amount.is_none() {
            missing.push("amount");
        }

        if request.balance.is_none() {
            missing.push("balance");
        }

        let (
            Some(external_id), Some(provider), Some(amount), Some(sender_number), Some(balance),
            Some(transaction_date), Some(transaction_time), Some(raw_sms)
        ) = (
            trx_id, provider, request.amount, sender_number, request.balance,
            transaction_date, transaction_time, raw_sms
        ) else {
            return Err(RequestError::MissingFields(missing));
        };

        //NOTE: Zero is refused here exactly as the parser refuses it.
        if amount <= Decimal::ZERO {
            return Err(RequestError::InvalidField("amount"));
        }

        if balance < Decimal::ZERO {
            return Err(RequestError::InvalidField("balance"));
        }

        Ok(ParsedTransaction {
            provider,
            amount: format_money(amount),
            sender_number,
            external_id,
            transaction_date: provider_format::parse_date(&transaction_date)
                .ok_or(RequestError::InvalidField("transactionDate"))?,
            transaction_time: provider_format::parse_time(&transaction_time)
                .ok_or(RequestError::InvalidField("transactionTime"))?,
            balance: format_money(balance),
            raw_sms
        })
    }
}

fn required_text(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => {
            missing.push(name);
            None
        }
    }
}
