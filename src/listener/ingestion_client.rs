use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::select;
use tokio::spawn;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::listener::pipeline::{cancelled, Pipeline};
use crate::listener::{
    Disposition, ListenerConfig, ListenerError, ListenerState, PermissionGate, ReconciliationQueue, SmsCallback,
    SmsSource, StatsSnapshot, SubmissionBoundary, SubscriptionHandle
};
use crate::models::RawNotification;

enum Envelope {
    Notification(RawNotification),
    Drain
}

struct ActiveSubscription {
    handle: SubscriptionHandle,
    sender: mpsc::UnboundedSender<Envelope>,
    cancel: watch::Sender<bool>,
    worker: JoinHandle<()>
}

/// Outcome of a manual re-sync of deferred submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResyncReport {
    pub created: usize,
    pub duplicate: usize,
    pub refused: usize,
    pub still_pending: usize
}

/// Bridges the platform SMS stream to the parser and the store boundary.
///
/// Notifications are processed one at a time in arrival order by a single
/// worker task. A bad message never stops the worker; a submission that keeps
/// failing is deferred to the reconciliation queue instead of blocking it.
pub struct IngestionClient<P: SmsSource, G: PermissionGate, B: SubmissionBoundary> {
    source: Arc<P>,
    permissions: Arc<G>,
    pipeline: Arc<Pipeline<B>>,
    state: watch::Sender<ListenerState>,
    active: Mutex<Option<ActiveSubscription>>
}

impl<P: SmsSource, G: PermissionGate, B: SubmissionBoundary> IngestionClient<P, G, B> {
    pub fn new(source: Arc<P>, permissions: Arc<G>, boundary: Arc<B>, config: ListenerConfig) -> Self {
        let (state, _) = watch::channel(ListenerState::Idle);

        Self {
            source,
            permissions,
            pipeline: Arc::new(Pipeline::new(boundary, config)),
            state,
            active: Mutex::new(None)
        }
    }

    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.pipeline.stats()
    }

    pub fn reconciliation(&self) -> &ReconciliationQueue {
        self.pipeline.reconciliation()
    }

    /// Starts listening, asking for permission first if it is not granted yet.
    ///
    /// Calling `start` while already listening is a no-op.
    ///
    /// # Errors
    /// - `PermissionDenied` if the platform refused access; the client returns to `Idle`.
    /// - `PermissionPending` if another `start` is waiting on the permission prompt.
    /// - `Cancelled` if `stop` was called while waiting on the permission prompt.
    pub async fn start(&self) -> Result<(), ListenerError> {
        match self.state() {
            ListenerState::Listening => return Ok(()),
            ListenerState::AwaitingPermission => return Err(ListenerError::PermissionPending),
            ListenerState::Idle => {}
        }

        if self.permissions.check().await {
            return self.activate(ListenerState::Idle);
        }

        let claimed = self.state.send_if_modified(|state| {
            if *state == ListenerState::Idle {
                *state = ListenerState::AwaitingPermission;
                true
            } else {
                false
            }
        });

        if !claimed {
            return match self.state() {
                ListenerState::Listening => Ok(()),
                _ => Err(ListenerError::PermissionPending)
            };
        }

        debug!("Requesting SMS read permission");

        if !self.permissions.request().await {
            self.state.send_if_modified(|state| {
                let was_waiting = *state == ListenerState::AwaitingPermission;
                if was_waiting {
                    *state = ListenerState::Idle;
                }
                was_waiting
            });

            warn!("SMS read permission denied, listener stays idle");
            return Err(ListenerError::PermissionDenied);
        }

        self.activate(ListenerState::AwaitingPermission)
    }

    /// Stops listening immediately. Safe to call in any state, including mid-retry.
    ///
    /// The platform subscription is released before this returns. A submission
    /// cut short by the stop is moved to the reconciliation queue.
    pub async fn stop(&self) {
        let Some(active) = self.deactivate() else {
            return;
        };

        self.source.unsubscribe(active.handle);
        let _ = active.cancel.send(true);

        if let Err(error) = active.worker.await {
            warn!("Listener worker did not stop gracefully: {error}");
        }

        info!("Listener stopped");
    }

    /// Stops listening after every notification received so far has been processed.
    pub async fn drain(&self) {
        let Some(active) = self.deactivate() else {
            return;
        };

        self.source.unsubscribe(active.handle);

        if active.sender.send(Envelope::Drain).is_err() {
            debug!("Listener worker already exited before drain");
        }

        if let Err(error) = active.worker.await {
            warn!("Listener worker did not drain gracefully: {error}");
        }

        info!("Listener drained and stopped");
    }

    /// Resubmits every deferred payload once, under the normal retry policy.
    pub async fn resync(&self) -> ResyncReport {
        let (_keep_alive, mut cancel) = watch::channel(false);
        let mut report = ResyncReport::default();

        for pending in self.pipeline.reconciliation().snapshot() {
            debug!("Re-submitting [{}] deferred at [{}]: {}", pending.payload.trx_id, pending.deferred_at, pending.reason);

            match self.pipeline.deliver(pending.payload, &mut cancel).await {
                Disposition::Created(_) => report.created += 1,
                Disposition::Duplicate(_) => report.duplicate += 1,
                Disposition::Refused(_) => report.refused += 1,
                _ => report.still_pending += 1
            }
        }

        info!("Re-sync finished: {report:?}");

        report
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveSubscription>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn activate(&self, expected: ListenerState) -> Result<(), ListenerError> {
        let mut active = self.lock_active();

        if active.is_some() {
            return Ok(());
        }

        if self.state() != expected {
            return Err(ListenerError::Cancelled);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let (cancel, cancel_receiver) = watch::channel(false);

        let forward = sender.clone();
        let callback: SmsCallback = Arc::new(move |notification| {
            if forward.send(Envelope::Notification(notification)).is_err() {
                debug!("Notification arrived after the listener stopped");
            }
        });

        let handle = self.source.subscribe(callback);
        let worker = spawn_worker(self.pipeline.clone(), receiver, cancel_receiver);

        *active = Some(ActiveSubscription { handle, sender, cancel, worker });
        self.state.send_replace(ListenerState::Listening);

        info!("Listener started");

        Ok(())
    }

    fn deactivate(&self) -> Option<ActiveSubscription> {
        let mut active = self.lock_active();
        self.state.send_replace(ListenerState::Idle);
        active.take()
    }
}

fn spawn_worker<B: SubmissionBoundary>(
    pipeline: Arc<Pipeline<B>>,
    mut receiver: mpsc::UnboundedReceiver<Envelope>,
    mut cancel: watch::Receiver<bool>
) -> JoinHandle<()> {
    spawn(async move {
        loop {
            let envelope = select! {
                biased;
                _ = cancelled(&mut cancel) => break,
                envelope = receiver.recv() => envelope
            };

            match envelope {
                Some(Envelope::Notification(notification)) => {
                    pipeline.handle(notification, &mut cancel).await;
                },
                Some(Envelope::Drain) | None => break
            }
        }

        //NOTE: Notifications still queued here were already taken from the platform and will not be redelivered.
        receiver.close();

        let mut stranded = 0;

        while let Ok(envelope) = receiver.try_recv() {
            if let Envelope::Notification(notification) = envelope {
                pipeline.set_aside(notification);
                stranded += 1;
            }
        }

        if stranded > 0 {
            info!("Listener worker set aside [{stranded}] unprocessed notifications");
        }

        debug!("Listener worker exited");
    })
}
