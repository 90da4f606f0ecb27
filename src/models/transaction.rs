use jiff::civil::{Date, Time};
use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::provider_format;
use crate::types::{format_money, RowId};

/// A transaction extracted from a provider notification.
///
/// Every field is required; the parser never produces a partially filled
/// record. Monetary values always carry two fractional digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    /// Issuing service, always the provider constant for parsed records.
    pub provider: String,
    /// Amount received.
    pub amount: Decimal,
    /// Digits of the counterparty's wallet number.
    pub sender_number: String,
    /// Provider transaction id (`TrxID`), unique per real-world event.
    pub external_id: String,
    /// Calendar date as issued by the provider.
    pub transaction_date: Date,
    /// Local time as issued by the provider.
    pub transaction_time: Time,
    /// Wallet balance snapshot after the transaction.
    pub balance: Decimal,
    /// Verbatim message body, kept for audit and re-parsing.
    pub raw_sms: String
}

/// A transaction as persisted by the store. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTransaction {
    pub id: RowId,
    #[serde(rename = "trxId")]
    pub external_id: String,
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
    pub raw_sms: String,
    pub created_at: Timestamp
}

impl StoredTransaction {
    /// Builds the persisted form of `parsed`, normalizing money to two fractional digits.
    pub fn from_parsed(id: RowId, created_at: Timestamp, parsed: ParsedTransaction) -> Self {
        Self {
            id,
            external_id: parsed.external_id,
            provider: parsed.provider,
            amount: format_money(parsed.amount),
            sender_number: parsed.sender_number,
            balance: format_money(parsed.balance),
            transaction_date: parsed.transaction_date,
            transaction_time: parsed.transaction_time,
            raw_sms: parsed.raw_sms,
            created_at
        }
    }
}
