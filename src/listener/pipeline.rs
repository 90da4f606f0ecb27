use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::future::Cache;
use tokio::select;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::listener::{ListenerConfig, ReconciliationQueue, RetryPolicy, Submission, SubmissionBoundary, SubmitError};
use crate::models::{CreateTransactionPayload, ParsedTransaction, RawNotification};
use crate::parser::{self, ParseFailure};

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not a transaction message.
    Ignored,
    /// Looked like a transaction message but could not be parsed.
    Rejected(ParseFailure),
    Created(String),
    Duplicate(String),
    /// The boundary refused the payload as a client error.
    Refused(String),
    /// Retries were exhausted or cut short; the payload waits for re-sync.
    Deferred(String)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub ignored: u64,
    pub rejected: u64,
    pub created: u64,
    pub duplicate: u64,
    pub refused: u64,
    pub deferred: u64
}

#[derive(Default)]
struct IngestionStats {
    ignored: AtomicU64,
    rejected: AtomicU64,
    created: AtomicU64,
    duplicate: AtomicU64,
    refused: AtomicU64,
    deferred: AtomicU64
}

impl IngestionStats {
    fn record(&self, disposition: &Disposition) {
        let counter = match disposition {
            Disposition::Ignored => &self.ignored,
            Disposition::Rejected(_) => &self.rejected,
            Disposition::Created(_) => &self.created,
            Disposition::Duplicate(_) => &self.duplicate,
            Disposition::Refused(_) => &self.refused,
            Disposition::Deferred(_) => &self.deferred
        };

        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ignored: self.ignored.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            refused: self.refused.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed)
        }
    }
}

enum Delivery {
    Accepted(Submission),
    Refused(String),
    Exhausted(String),
    Cancelled
}

/// Parse, submit and retry logic shared by the listener worker and re-sync.
pub(crate) struct Pipeline<B: SubmissionBoundary> {
    boundary: Arc<B>,
    policy: RetryPolicy,
    recently_ingested: Cache<String, ()>,
    reconciliation: ReconciliationQueue,
    stats: IngestionStats
}

impl<B: SubmissionBoundary> Pipeline<B> {
    pub(crate) fn new(boundary: Arc<B>, config: ListenerConfig) -> Self {
        Self {
            boundary,
            policy: config.retry,
            recently_ingested: Cache::builder()
                .max_capacity(config.recent_capacity)
                .time_to_live(config.recent_ttl)
                .build(),
            reconciliation: ReconciliationQueue::new(),
            stats: IngestionStats::default()
        }
    }

    pub(crate) fn reconciliation(&self) -> &ReconciliationQueue {
        &self.reconciliation
    }

    pub(crate) fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Processes one notification to a terminal disposition. Never fails the caller.
    pub(crate) async fn handle(&self, notification: RawNotification, cancel: &mut watch::Receiver<bool>) -> Disposition {
        let disposition = match self.screen(&notification) {
            Ok(parsed) => self.deliver(CreateTransactionPayload::from(&parsed), cancel).await,
            Err(disposition) => disposition
        };

        self.stats.record(&disposition);

        disposition
    }

    /// Settles a notification that was accepted from the platform but never submitted
    /// because the listener stopped first. Submittable transactions wait for re-sync.
    pub(crate) fn set_aside(&self, notification: RawNotification) -> Disposition {
        let disposition = match self.screen(&notification) {
            Ok(parsed) => {
                warn!("Listener stopped before transaction [{}] was submitted, deferring for re-sync", parsed.external_id);
                self.reconciliation.defer(CreateTransactionPayload::from(&parsed), "listener stopped before submission".to_string());
                Disposition::Deferred(parsed.external_id)
            },
            Err(disposition) => disposition
        };

        self.stats.record(&disposition);

        disposition
    }

    /// Parses `notification` and filters out anything that must not be submitted.
    fn screen(&self, notification: &RawNotification) -> Result<ParsedTransaction, Disposition> {
        match parser::parse_notification(notification) {
            Err(failure) if failure.is_ignorable() => {
                debug!("Ignoring notification from [{}]", notification.sender);
                Err(Disposition::Ignored)
            },
            Err(failure) => {
                match notification.received_at {
                    Some(received_at) => warn!("Dropping notification from [{}] received at [{received_at}]: {failure}", notification.sender),
                    None => warn!("Dropping notification from [{}]: {failure}", notification.sender)
                }
                Err(Disposition::Rejected(failure))
            },
            Ok(parsed) if self.recently_ingested.contains_key(&parsed.external_id) => {
                debug!("Transaction [{}] was already ingested by this client", parsed.external_id);
                Err(Disposition::Duplicate(parsed.external_id))
            },
            Ok(parsed) => Ok(parsed)
        }
    }

    /// Submits `payload` under the retry policy and settles or defers it accordingly.
    pub(crate) async fn deliver(&self, payload: CreateTransactionPayload, cancel: &mut watch::Receiver<bool>) -> Disposition {
        let trx_id = payload.trx_id.clone();

        match self.submit_with_retry(&payload, cancel).await {
            Delivery::Accepted(submission) => {
                self.recently_ingested.insert(trx_id.clone(), ()).await;
                self.reconciliation.settle(&trx_id);

                match submission {
                    Submission::Created(row) => {
                        info!("Transaction [{trx_id}] ingested as row [{}]", row.id);
                        Disposition::Created(trx_id)
                    },
                    Submission::Duplicate => {
                        info!("Transaction [{trx_id}] already exists, nothing to do");
                        Disposition::Duplicate(trx_id)
                    }
                }
            },
            Delivery::Refused(reason) => {
                error!("Transaction [{trx_id}] was refused by the store boundary: {reason}");
                self.reconciliation.settle(&trx_id);
                Disposition::Refused(trx_id)
            },
            Delivery::Exhausted(reason) => {
                error!("Transaction [{trx_id}] could not be submitted, deferring for re-sync: {reason}");
                self.reconciliation.defer(payload, reason);
                Disposition::Deferred(trx_id)
            },
            Delivery::Cancelled => {
                warn!("Listener stopped while submitting transaction [{trx_id}], deferring for re-sync");
                self.reconciliation.defer(payload, "listener stopped during submission".to_string());
                Disposition::Deferred(trx_id)
            }
        }
    }

    async fn submit_with_retry(&self, payload: &CreateTransactionPayload, cancel: &mut watch::Receiver<bool>) -> Delivery {
        let attempts = self.policy.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let outcome = select! {
                biased;
                _ = cancelled(cancel) => return Delivery::Cancelled,
                outcome = timeout(self.policy.submit_timeout, self.boundary.submit(payload)) => outcome
            };

            match outcome {
                Ok(Ok(submission)) => return Delivery::Accepted(submission),
                Ok(Err(SubmitError::Rejected(reason))) => return Delivery::Refused(reason),
                Ok(Err(SubmitError::Transient(reason))) => last_error = reason,
                Err(_) => last_error = format!("submission timed out after {:?}", self.policy.submit_timeout)
            }

            if attempt == attempts {
                break;
            }

            let delay = self.policy.backoff_for(attempt);
            warn!("Submission of [{}] failed on attempt [{attempt}/{attempts}], retrying in {delay:?}: {last_error}", payload.trx_id);

            select! {
                biased;
                _ = cancelled(cancel) => return Delivery::Cancelled,
                _ = sleep(delay) => {}
            }
        }

        Delivery::Exhausted(last_error)
    }
}

/// Resolves once cancellation is signalled or its sender is gone.
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }

        if cancel.changed().await.is_err() {
            return;
        }
    }
}
