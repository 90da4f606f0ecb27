use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};

use crate::models::{ParsedTransaction, StoredTransaction};
use crate::storage::{CreateOutcome, StoreError, TransactionStore, TransactionTable};
use crate::types::RowId;

/// Exactly-once store for transactions, keyed by external id.
///
/// The lookup before insert only avoids needless work; the table's uniqueness
/// constraint is what guarantees a single row per external id, and a violation
/// of it is reported as [`CreateOutcome::Duplicate`].
pub struct TransactionStorage<T: TransactionTable> {
    table: Arc<T>,
    next_id: AtomicU64
}

impl<T: TransactionTable> TransactionStorage<T> {
    /// Takes ownership of `table` and continues id assignment after its largest row id.
    pub fn new(table: T) -> Result<Self, StoreError> {
        let last_id = table.rows()?.iter().map(|row| row.id).max().unwrap_or(0);

        Ok(Self {
            table: Arc::new(table),
            next_id: AtomicU64::new(last_id + 1)
        })
    }

    fn allocate_id(&self) -> RowId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl<T: TransactionTable> TransactionStore for TransactionStorage<T> {
    async fn create(&self, candidate: ParsedTransaction) -> Result<CreateOutcome, StoreError> {
        if self.table.find(&candidate.external_id)?.is_some() {
            debug!("Transaction [{}] already stored", candidate.external_id);
            return Ok(CreateOutcome::Duplicate);
        }

        let external_id = candidate.external_id.clone();
        let row = StoredTransaction::from_parsed(self.allocate_id(), Timestamp::now(), candidate);

        //NOTE: Durable tables write and flush on insert, which must stay off the async workers.
        let table = self.table.clone();
        let pending = row.clone();
        let inserted = match spawn_blocking(move || table.insert(pending)).await {
            Ok(result) => result,
            Err(error) => Err(StoreError::Unavailable(format!("insert task for [{external_id}] failed: {error}")))
        };

        match inserted {
            Ok(()) => {
                info!("Transaction [{external_id}] stored as row [{}]", row.id);
                Ok(CreateOutcome::Created(row))
            },
            Err(error) if error.is_duplicate_external_id() => {
                debug!("Transaction [{external_id}] was stored concurrently: {error}");
                Ok(CreateOutcome::Duplicate)
            },
            Err(error) => {
                error!("Transaction [{external_id}] could not be stored: {error}");
                Err(error)
            }
        }
    }

    async fn list(&self) -> Result<Vec<StoredTransaction>, StoreError> {
        let mut rows = self.table.rows()?;

        //NOTE: Ids are assigned in creation order, so they break ties between equal timestamps.
        rows.sort_by_key(|row| Reverse((row.created_at, row.id)));

        Ok(rows)
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<StoredTransaction>, StoreError> {
        self.table.find(external_id)
    }
}
