use super::ReplayEngine;

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::api::TransactionApi;
use crate::listener::ListenerConfig;
use crate::storage::{MemoryTable, TransactionStorage, TransactionStore};

const BODY: &str = "You have received Tk 380.00 from 01831638032. Fee Tk 0.00. Balance Tk 508.03. TrxID DA72U4603O at 07/01/2026 19:06";

fn create_temporary_export(rows: &[(&str, &str, &str)]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;

    writeln!(file, "sender,body,received_at")?;

    for (sender, body, received_at) in rows {
        writeln!(file, "\"{}\",\"{}\",{}", sender, body.replace('"', "\"\""), received_at)?;
    }

    Ok(file)
}

fn engine() -> Result<(ReplayEngine<TransactionApi<TransactionStorage<MemoryTable>>>, Arc<TransactionStorage<MemoryTable>>)> {
    let storage = Arc::new(TransactionStorage::new(MemoryTable::new())?);
    let api = Arc::new(TransactionApi::new(storage.clone()));

    Ok((ReplayEngine::new(api, ListenerConfig::default()), storage))
}

#[tokio::test]
async fn test_engine_replays_export_into_store() -> Result<()> {
    let second = BODY.replace("DA72U4603O", "DB11X2200Z").replace("Tk 380.00", "Tk 1,200.00");
    let file = create_temporary_export(&[
        ("bKash Alert", BODY, "2026-01-07T13:06:00Z"),
        ("bKash Alert", second.as_str(), ""),
        ("bKash Alert", BODY, ""),
        ("bKash", "Your OTP is 123456", ""),
        ("bKash", BODY.replace("Balance Tk 508.03. ", "").as_str(), "")
    ])?;

    let (engine, storage) = engine()?;
    let summary = engine.run(&file.path().to_string_lossy()).await?;

    assert_eq!(summary.delivered, 5);
    assert_eq!(summary.stats.created, 2);
    assert_eq!(summary.stats.duplicate, 1);
    assert_eq!(summary.stats.ignored, 1);
    assert_eq!(summary.stats.rejected, 1);
    assert_eq!(summary.pending, 0);
    assert!(summary.resync.is_none());

    let rows = storage.list().await?;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].external_id, "DB11X2200Z");
    assert_eq!(rows[0].amount.to_string(), "1200.00");

    Ok(())
}

#[tokio::test]
async fn test_engine_replay_twice_is_idempotent() -> Result<()> {
    let file = create_temporary_export(&[("bKash Alert", BODY, "")])?;
    let (engine, storage) = engine()?;

    engine.run(&file.path().to_string_lossy()).await?;
    engine.run(&file.path().to_string_lossy()).await?;

    assert_eq!(storage.list().await?.len(), 1);
    assert_eq!(engine.client().stats().created, 1);
    assert_eq!(engine.client().stats().duplicate, 1);

    Ok(())
}

#[tokio::test]
async fn test_engine_skips_malformed_rows() -> Result<()> {
    let file = create_temporary_export(&[
        ("bKash Alert", BODY, "not-a-timestamp"),
        ("bKash Alert", BODY.replace("DA72U4603O", "DC00").as_str(), "")
    ])?;

    let (engine, storage) = engine()?;
    let summary = engine.run(&file.path().to_string_lossy()).await?;

    assert_eq!(summary.delivered, 1);
    assert_eq!(storage.list().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_engine_handles_missing_export_without_error() -> Result<()> {
    let (engine, storage) = engine()?;
    let summary = engine.run("missing.csv").await?;

    assert_eq!(summary.delivered, 0);
    assert!(storage.list().await?.is_empty());

    Ok(())
}
