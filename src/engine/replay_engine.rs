use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use csv::{ReaderBuilder, Trim};
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{error, info};

use crate::listener::{
    GrantedPermission, IngestionClient, ListenerConfig, LocalSource, ResyncReport, StatsSnapshot, SubmissionBoundary
};
use crate::models::RawNotification;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Rows read from the export and handed to the listener.
    pub delivered: usize,
    pub stats: StatsSnapshot,
    /// Outcome of the closing re-sync pass, if anything was deferred.
    pub resync: Option<ResyncReport>,
    /// Submissions still waiting for reconciliation after the run.
    pub pending: usize
}

/// Plays an SMS export through the ingestion listener as if the platform delivered it live.
///
/// Export rows are `sender,body,received_at` with an optional `received_at`.
pub struct ReplayEngine<B: SubmissionBoundary> {
    source: Arc<LocalSource>,
    client: IngestionClient<LocalSource, GrantedPermission, B>,
    backpressure: usize
}

impl<B: SubmissionBoundary> ReplayEngine<B> {
    pub fn new(boundary: Arc<B>, config: ListenerConfig) -> Self {
        let source = Arc::new(LocalSource::new());
        let client = IngestionClient::new(source.clone(), Arc::new(GrantedPermission), boundary, config);

        Self {
            source,
            client,
            backpressure: 256
        }
    }

    pub fn client(&self) -> &IngestionClient<LocalSource, GrantedPermission, B> {
        &self.client
    }

    /// Replays the export at `path`, waits for every message to settle and re-syncs once.
    pub async fn run(&self, path: &str) -> anyhow::Result<ReplaySummary> {
        self.client.start().await?;

        let (sender, mut receiver) = mpsc::channel::<RawNotification>(self.backpressure);
        let csv_handle = self.spawn_csv_reader(path.to_string(), sender);
        let mut delivered = 0;

        while let Some(notification) = receiver.recv().await {
            if self.source.deliver(notification) == 0 {
                error!("No listener subscribed, replayed notification was dropped");
            } else {
                delivered += 1;
            }
        }

        if let Err(error) = csv_handle.await {
            error!("SMS export ingestion failed: {error}");
        }

        self.client.drain().await;

        let resync = if self.client.reconciliation().is_empty() {
            None
        } else {
            Some(self.client.resync().await)
        };

        let summary = ReplaySummary {
            delivered,
            stats: self.client.stats(),
            resync,
            pending: self.client.reconciliation().len()
        };

        info!("Replay finished: {summary:?}");

        Ok(summary)
    }

    fn spawn_csv_reader(&self, path: String, sender: mpsc::Sender<RawNotification>) -> JoinHandle<()> {
        spawn_blocking(move || {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(error) => {
                    error!("Error opening SMS export at path: {path} | {error}");
                    return;
                }
            };

            let mut reader = ReaderBuilder::new()
                .trim(Trim::All)
                .flexible(true)
                .from_reader(BufReader::new(file));

            for result in reader.deserialize::<RawNotification>() {
                match result {
                    Ok(notification) => {
                        if sender.blocking_send(notification).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        error!("SMS export deserialization error: {error}");
                    }
                }
            }
        })
    }
}
