//! Periodic fan-out of the transaction dataset to every connected client.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use ledgercast_core::{LedgercastError, LedgercastResult, TransactionSource};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BroadcastConfig;
use crate::registry::{ClientChannel, ConnectionRegistry};
use crate::state::SharedDataset;

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Dataset length after this tick's append.
    pub dataset_len: usize,
    /// Channels in the snapshot taken for this tick.
    pub recipients: usize,
    pub delivered: usize,
    /// Channels that failed and were unregistered.
    pub failed: usize,
}

/// Appends a transaction and pushes the full dataset on every tick.
pub struct Broadcaster {
    dataset: SharedDataset,
    registry: ConnectionRegistry,
    source: Arc<dyn TransactionSource>,
    config: BroadcastConfig,
}

impl Broadcaster {
    pub fn new(
        dataset: SharedDataset,
        registry: ConnectionRegistry,
        source: Arc<dyn TransactionSource>,
        config: BroadcastConfig,
    ) -> Self {
        Self {
            dataset,
            registry,
            source,
            config,
        }
    }

    /// Run one append, serialize, fan-out cycle.
    ///
    /// An error means nothing was sent this tick. Per-client send failures are
    /// not errors; they show up in [`TickReport::failed`].
    pub async fn tick(&self) -> LedgercastResult<TickReport> {
        let transaction = self.source.next_transaction().await?;

        let (payload, dataset_len) = {
            let mut dataset = self.dataset.write().await;
            dataset.try_push(transaction)?;
            (Utf8Bytes::from(dataset.to_payload()?), dataset.len())
        };

        let recipients = self.registry.snapshot();
        let mut report = TickReport {
            dataset_len,
            recipients: recipients.len(),
            delivered: 0,
            failed: 0,
        };

        for channel in &recipients {
            match self.send_one(channel, payload.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        conn_id = %channel.id(),
                        error = %e,
                        "Failed to push transactions, dropping client"
                    );
                    self.registry.evict(channel);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn send_one(&self, channel: &ClientChannel, payload: Utf8Bytes) -> LedgercastResult<()> {
        let timeout = self.config.send_timeout;
        time::timeout(timeout, channel.send(payload))
            .await
            .map_err(|_| LedgercastError::SendTimeout(timeout))?
    }

    /// Tick every configured interval until `shutdown` is cancelled.
    ///
    /// The first tick fires one full interval after start.
    pub async fn run(self, shutdown: CancellationToken) {
        let period = self.config.tick_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(tick_secs = period.as_secs_f64(), "Broadcast loop started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => match self.tick().await {
                    Ok(report) => debug!(
                        transactions = report.dataset_len,
                        recipients = report.recipients,
                        delivered = report.delivered,
                        failed = report.failed,
                        "Broadcast tick complete"
                    ),
                    Err(e) => warn!(error = %e, "Broadcast tick skipped"),
                },
            }
        }

        info!("Broadcast loop stopped");
    }

    /// Spawn [`Broadcaster::run`] on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
