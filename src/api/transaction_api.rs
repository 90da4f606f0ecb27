use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::api::ApiResponse;
use crate::listener::{Submission, SubmissionBoundary, SubmitError};
use crate::models::{CreateTransactionPayload, CreateTransactionRequest, ParsedTransaction, RequestError, StoredTransaction};
use crate::storage::{CreateOutcome, TransactionStore};

/// Store boundary: validates JSON requests and marshals them onto a [`TransactionStore`].
///
/// Transport framing and caller authentication belong to whatever serves this
/// over the network; this type only owns request validation and response shape.
pub struct TransactionApi<S: TransactionStore> {
    store: Arc<S>
}

impl<S: TransactionStore> TransactionApi<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// `POST` create. All eight payload fields are mandatory.
    pub async fn create(&self, body: &str) -> ApiResponse<StoredTransaction> {
        let request: CreateTransactionRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(error) => {
                warn!("Rejected create request with malformed body: {error}");
                return ApiResponse::failure(400, "Invalid request body", Some(error.to_string()));
            }
        };

        let candidate = match ParsedTransaction::try_from(request) {
            Ok(candidate) => candidate,
            Err(error) => {
                warn!("Rejected create request: {error}");
                let message = match error {
                    RequestError::MissingFields(_) => "Missing required fields",
                    RequestError::InvalidField(_) => "Invalid field value"
                };
                return ApiResponse::failure(400, message, Some(error.to_string()));
            }
        };

        match self.store.create(candidate).await {
            Ok(CreateOutcome::Created(row)) => ApiResponse::ok(201, "Transaction created successfully", row),
            Ok(CreateOutcome::Duplicate) => ApiResponse::duplicate(),
            Err(error) => {
                error!("Error creating transaction: {error}");
                ApiResponse::failure(500, "Internal server error", Some(error.to_string()))
            }
        }
    }

    /// `GET` list, newest-created first.
    pub async fn list(&self) -> ApiResponse<Vec<StoredTransaction>> {
        match self.store.list().await {
            Ok(rows) => {
                let count = rows.len();
                ApiResponse::ok(200, "Transactions retrieved successfully", rows).with_count(count)
            },
            Err(error) => {
                error!("Error fetching transactions: {error}");
                ApiResponse::failure(500, "Internal server error", Some(error.to_string()))
            }
        }
    }

    /// `GET` by external id.
    pub async fn get(&self, trx_id: &str) -> ApiResponse<StoredTransaction> {
        if trx_id.trim().is_empty() {
            return ApiResponse::failure(400, "Transaction ID is required", None);
        }

        match self.store.get_by_external_id(trx_id).await {
            Ok(Some(row)) => ApiResponse::ok(200, "Transaction retrieved successfully", row),
            Ok(None) => ApiResponse::failure(404, "Transaction not found", None),
            Err(error) => {
                error!("Error fetching transaction [{trx_id}]: {error}");
                ApiResponse::failure(500, "Internal server error", Some(error.to_string()))
            }
        }
    }
}

#[async_trait]
impl<S: TransactionStore> SubmissionBoundary for TransactionApi<S> {
    async fn submit(&self, payload: &CreateTransactionPayload) -> Result<Submission, SubmitError> {
        let body = serde_json::to_string(payload)
            .map_err(|error| SubmitError::Rejected(format!("payload could not be encoded: {error}")))?;

        let response = self.create(&body).await;
        let detail = response.error.clone().unwrap_or_else(|| response.message.clone());

        match response.status {
            201 => response.data
                .map(Submission::Created)
                .ok_or_else(|| SubmitError::Transient("created response carried no record".to_string())),
            200 if response.is_duplicate() => {
                debug!("Boundary reported transaction [{}] as duplicate", payload.trx_id);
                Ok(Submission::Duplicate)
            },
            400..=499 => Err(SubmitError::Rejected(detail)),
            _ => Err(SubmitError::Transient(detail))
        }
    }
}
