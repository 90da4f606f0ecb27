mod errors;
mod ingestion_client;
mod pipeline;
mod platform;
mod reconciliation;
mod retry;
mod state;

use async_trait::async_trait;

use crate::models::{CreateTransactionPayload, StoredTransaction};

pub use errors::{ListenerError, SubmitError};
pub use ingestion_client::{IngestionClient, ResyncReport};
pub use pipeline::{Disposition, StatsSnapshot};
pub use platform::{GrantedPermission, LocalSource, PermissionGate, SmsCallback, SmsSource, SubscriptionHandle};
pub use reconciliation::{PendingSubmission, ReconciliationQueue};
pub use retry::{ListenerConfig, RetryPolicy};
pub use state::ListenerState;

/// Terminal success outcomes of a submission. Both end processing of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Created(StoredTransaction),
    Duplicate
}

/// Network boundary in front of the store, as seen by the ingestion client.
#[async_trait]
pub trait SubmissionBoundary: Send + Sync + 'static {
    async fn submit(&self, payload: &CreateTransactionPayload) -> Result<Submission, SubmitError>;
}
