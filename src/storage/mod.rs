mod errors;
mod journal_table;
mod memory_table;
mod transaction_storage;

use async_trait::async_trait;

use crate::models::{ParsedTransaction, StoredTransaction};

pub use errors::StoreError;
pub use journal_table::JournalTable;
pub use memory_table::MemoryTable;
pub use transaction_storage::TransactionStorage;

/// Result of a create call. A duplicate is a successful no-op, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(StoredTransaction),
    Duplicate
}

/// System of record for ingested transactions, keyed by external id.
#[async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    /// Stores `candidate` unless a row with the same external id already exists.
    async fn create(&self, candidate: ParsedTransaction) -> Result<CreateOutcome, StoreError>;

    /// All rows, most recently created first.
    async fn list(&self) -> Result<Vec<StoredTransaction>, StoreError>;

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<StoredTransaction>, StoreError>;
}

/// Storage layer underneath the store.
///
/// Implementations must reject a second row with an already stored external
/// id with [`StoreError::UniqueViolation`] on the `external_id` column, atomically
/// with respect to concurrent inserts.
pub trait TransactionTable: Send + Sync + 'static {
    fn find(&self, external_id: &str) -> Result<Option<StoredTransaction>, StoreError>;
    fn insert(&self, row: StoredTransaction) -> Result<(), StoreError>;
    fn rows(&self) -> Result<Vec<StoredTransaction>, StoreError>;
}
