use super::TransactionApi;
use crate::listener::{Submission, SubmissionBoundary, SubmitError};
use crate::models::{CreateTransactionPayload, ParsedTransaction, StoredTransaction};
use crate::parser;
use crate::storage::{MemoryTable, StoreError, TransactionStorage, TransactionTable};

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::sync::Arc;

const BODY: &str = "You have received Tk 380.00 from 01831638032. Fee Tk 0.00. Balance Tk 508.03. TrxID DA72U4603O at 07/01/2026 19:06";

fn api() -> Result<TransactionApi<TransactionStorage<MemoryTable>>> {
    Ok(TransactionApi::new(Arc::new(TransactionStorage::new(MemoryTable::new())?)))
}

fn payload() -> Result<CreateTransactionPayload> {
    let parsed: ParsedTransaction = parser::parse("bKash Alert", BODY)?;
    Ok(CreateTransactionPayload::from(&parsed))
}

fn request_body() -> Result<Value> {
    Ok(serde_json::to_value(payload()?)?)
}

struct OfflineTable;

impl TransactionTable for OfflineTable {
    fn find(&self, _external_id: &str) -> Result<Option<StoredTransaction>, StoreError> {
        Err(StoreError::Unavailable("database is offline".to_string()))
    }

    fn insert(&self, _row: StoredTransaction) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database is offline".to_string()))
    }

    fn rows(&self) -> Result<Vec<StoredTransaction>, StoreError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_create_returns_created_then_duplicate() -> Result<()> {
    let api = api()?;
    let body = request_body()?.to_string();

    let created = api.create(&body).await;

    assert_eq!(created.status, 201);
    assert!(created.success);
    assert_eq!(created.data.as_ref().map(|row| row.external_id.as_str()), Some("DA72U4603O"));

    let duplicate = api.create(&body).await;

    assert_eq!(duplicate.status, 200);
    assert!(duplicate.success);
    assert!(duplicate.is_duplicate());
    assert!(duplicate.data.is_none());

    let serialized = serde_json::to_value(&duplicate)?;

    assert_eq!(serialized, json!({ "success": true, "message": "Transaction already exists", "duplicate": true }));

    Ok(())
}

#[tokio::test]
async fn test_created_response_serializes_record_in_wire_shape() -> Result<()> {
    let api = api()?;
    let created = api.create(&request_body()?.to_string()).await;
    let serialized = serde_json::to_value(&created)?;
    let data = serialized.get("data").ok_or_else(|| anyhow!("data missing"))?;

    assert_eq!(data["trxId"], json!("DA72U4603O"));
    assert_eq!(data["amount"].as_f64(), Some(380.0));
    assert_eq!(data["transactionTime"], json!("19:06"));
    assert!(data["createdAt"].is_string());
    assert!(serialized.get("status").is_none());

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_missing_fields_without_touching_store() -> Result<()> {
    let api = api()?;

    for field in ["trxId", "provider", "amount", "senderNumber", "balance", "transactionDate", "transactionTime", "rawSms"] {
        let mut body = request_body()?;
        body.as_object_mut().ok_or_else(|| anyhow!("not an object"))?.remove(field);

        let response = api.create(&body.to_string()).await;

        assert_eq!(response.status, 400, "field [{field}]");
        assert_eq!(response.message, "Missing required fields");
    }

    assert_eq!(api.list().await.count, Some(0));

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_malformed_json() -> Result<()> {
    let api = api()?;

    assert_eq!(api.create("{not json").await.status, 400);
    assert_eq!(api.create(r#"{"amount": "lots"}"#).await.status, 400);

    Ok(())
}

#[tokio::test]
async fn test_list_and_lookup() -> Result<()> {
    let api = api()?;
    api.create(&request_body()?.to_string()).await;

    let listed = api.list().await;

    assert_eq!(listed.status, 200);
    assert_eq!(listed.count, Some(1));

    assert_eq!(api.get("DA72U4603O").await.status, 200);
    assert_eq!(api.get("MISSING").await.status, 404);
    assert_eq!(api.get("  ").await.status, 400);

    Ok(())
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() -> Result<()> {
    let api = TransactionApi::new(Arc::new(TransactionStorage::new(OfflineTable)?));
    let response = api.create(&request_body()?.to_string()).await;

    assert_eq!(response.status, 500);
    assert!(!response.success);
    assert_eq!(api.get("DA72U4603O").await.status, 500);

    Ok(())
}

#[tokio::test]
async fn test_boundary_maps_responses_to_submissions() -> Result<()> {
    let api = api()?;
    let payload = payload()?;

    assert!(matches!(api.submit(&payload).await, Ok(Submission::Created(_))));
    assert_eq!(api.submit(&payload).await, Ok(Submission::Duplicate));

    let mut empty_id = payload.clone();
    empty_id.trx_id = String::new();

    assert!(matches!(api.submit(&empty_id).await, Err(SubmitError::Rejected(_))));

    let offline = TransactionApi::new(Arc::new(TransactionStorage::new(OfflineTable)?));

    assert!(matches!(offline.submit(&payload).await, Err(SubmitError::Transient(_))));

    Ok(())
}
