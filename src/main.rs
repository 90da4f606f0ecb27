mod api;
mod engine;
mod listener;
mod models;
mod parser;
mod storage;
mod types;

use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::api::TransactionApi;
use crate::engine::ReplayEngine;
use crate::listener::ListenerConfig;
use crate::models::provider_format::{format_date, format_time};
use crate::models::StoredTransaction;
use crate::storage::{JournalTable, MemoryTable, TransactionStorage, TransactionStore, TransactionTable};

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: Three positional arguments do not justify a full argument parser yet.
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: bkash-sms-ingest [sms_export].csv [log_level:optional] [journal.csv:optional] > [report].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    match args.get(3) {
        Some(journal) => replay(JournalTable::open(journal)?, path).await,
        None => replay(MemoryTable::new(), path).await
    }
}

async fn replay<T: TransactionTable>(table: T, path: &str) -> Result<()> {
    let storage = Arc::new(TransactionStorage::new(table)?);
    let api = Arc::new(TransactionApi::new(storage));
    let engine = ReplayEngine::new(api.clone(), ListenerConfig::default());

    let timer = Instant::now();
    let summary = engine.run(path).await?;
    let duration = timer.elapsed();

    info!("Processed notifications in: {duration:?}");

    if summary.pending > 0 {
        warn!("[{}] transactions are still waiting for re-sync", summary.pending);
    }

    write_results_to_stdout(&api.store().list().await?)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the report, so logs go to stderr.
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(rows: &[StoredTransaction]) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "id,trx_id,provider,amount,sender_number,balance,transaction_date,transaction_time,created_at")?;

    for row in rows {
        writeln!(
            output,
            "{},{},{},{},{},{},{},{},{}",
            row.id,
            row.external_id,
            row.provider,
            row.amount,
            row.sender_number,
            row.balance,
            format_date(row.transaction_date),
            format_time(row.transaction_time),
            row.created_at
        )?;
    }

    output.flush()?;

    Ok(())
}
