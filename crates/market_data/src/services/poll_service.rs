use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage, ShutdownSignal, shutdown_requested};
use common::models::MarketSnapshot;

use crate::services::feed_coordinator::FeedCoordinator;
use crate::traits::MarketSource;

/// Reads a consistent snapshot, hands it downstream, then sleeps for the
/// poll interval before the next read.
///
/// A failed read is logged and skipped; the next cycle tries again.
pub struct PollService<S> {
    id: Uuid,
    coordinator: Arc<FeedCoordinator<S>>,
    depth: usize,
    interval: Duration,
    snapshot_tx: mpsc::Sender<MarketSnapshot>,
}

#[async_trait]
impl<S: MarketSource + 'static> Actor for PollService<S> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::PollActor
    }

    async fn run(
        &mut self,
        supervisor_tx: mpsc::Sender<ControlMessage>,
        mut shutdown: ShutdownSignal,
    ) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        info!(depth = self.depth, every = ?self.interval, "Starting snapshot poller");

        loop {
            match self.coordinator.snapshot(self.depth).await {
                Ok(snapshot) => {
                    debug!(
                        bids = snapshot.bids.len(),
                        asks = snapshot.asks.len(),
                        trades = snapshot.trades.len(),
                        "snapshot read"
                    );
                    if self.snapshot_tx.send(snapshot).await.is_err() {
                        let err_msg = "Snapshot channel closed unexpectedly.".to_string();
                        heartbeat_handle.abort();
                        supervisor_tx
                            .send(ControlMessage::Error(self.id, err_msg.clone()))
                            .await?;
                        bail!(err_msg);
                    }
                }
                Err(e) if e.is_transport() || e.is_parse() => {
                    warn!(error = %e, "snapshot read skipped");
                }
                Err(e) => {
                    error!(error = %e, "snapshot read failed");
                    supervisor_tx
                        .send(ControlMessage::Error(self.id, format!("Snapshot read failed: {e}")))
                        .await?;
                }
            }

            // interval counts from the end of the read
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                _ = time::sleep(self.interval) => {}
            }
        }

        info!("snapshot poller stopped");
        heartbeat_handle.abort();
        let _ = supervisor_tx.send(ControlMessage::Shutdown(self.id)).await;
        Ok(())
    }
}

impl<S: MarketSource> PollService<S> {
    pub fn new(
        coordinator: Arc<FeedCoordinator<S>>,
        depth: usize,
        interval: Duration,
        snapshot_tx: mpsc::Sender<MarketSnapshot>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinator,
            depth,
            interval,
            snapshot_tx,
        }
    }
}
