use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::StoredTransaction;
use crate::storage::{StoreError, TransactionTable};

/// In-process table with a uniqueness constraint on the external id.
#[derive(Default)]
pub struct MemoryTable {
    rows: DashMap<String, StoredTransaction>
}

impl MemoryTable {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new()
        }
    }

    /// Inserts `row` only if its external id is free, running `commit` first.
    ///
    /// The shard holding the external id stays locked while `commit` runs, so a
    /// durable write and the in-memory insert are never observed separately.
    pub fn insert_with<F>(&self, row: StoredTransaction, commit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&StoredTransaction) -> Result<(), StoreError>
    {
        match self.rows.entry(row.external_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::duplicate_external_id(&row.external_id)),
            Entry::Vacant(vacant) => {
                commit(&row)?;
                vacant.insert(row);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

impl TransactionTable for MemoryTable {
    fn find(&self, external_id: &str) -> Result<Option<StoredTransaction>, StoreError> {
        Ok(self.rows.get(external_id).map(|row| row.value().clone()))
    }

    fn insert(&self, row: StoredTransaction) -> Result<(), StoreError> {
        self.insert_with(row, |_| Ok(()))
    }

    fn rows(&self) -> Result<Vec<StoredTransaction>, StoreError> {
        Ok(self.rows.iter().map(|row| row.value().clone()).collect())
    }
}
