use dashmap::DashMap;
use jiff::Timestamp;

use crate::models::CreateTransactionPayload;

/// A parsed transaction that could not be handed to the store.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub payload: CreateTransactionPayload,
    pub reason: String,
    pub deferred_at: Timestamp
}

/// Submissions waiting for a manual re-sync, at most one per transaction id.
#[derive(Default)]
pub struct ReconciliationQueue {
    pending: DashMap<String, PendingSubmission>
}

impl ReconciliationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&self, payload: CreateTransactionPayload, reason: String) {
        let entry = PendingSubmission {
            payload,
            reason,
            deferred_at: Timestamp::now()
        };

        self.pending.insert(entry.payload.trx_id.clone(), entry);
    }

    pub fn settle(&self, trx_id: &str) -> Option<PendingSubmission> {
        self.pending.remove(trx_id).map(|(_, entry)| entry)
    }

    pub fn contains(&self, trx_id: &str) -> bool {
        self.pending.contains_key(trx_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending entries, oldest first.
    pub fn snapshot(&self) -> Vec<PendingSubmission> {
        let mut entries: Vec<PendingSubmission> = self.pending.iter().map(|entry| entry.value().clone()).collect();
        entries.sort_by_key(|entry| entry.deferred_at);
        entries
    }
}
