use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::{sync::mpsc, time};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage, ShutdownSignal, shutdown_requested};
use common::error::FeedError;

use crate::remote::{StreamEvent, SubscribeRequest, parse_stream_message};
use crate::services::feed_coordinator::FeedCoordinator;
use crate::traits::MarketSource;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const SYNC_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Owns the websocket to the delta channel and feeds every diff into the
/// coordinator. Each (re)connection subscribes again and starts a fresh
/// synchronization with the REST order book.
pub struct FeedGateway<S> {
    id: Uuid,
    ws_url: String,
    market: String,
    coordinator: Arc<FeedCoordinator<S>>,
}

#[async_trait]
impl<S: MarketSource + 'static> Actor for FeedGateway<S> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::FeedGatewayActor
    }

    async fn run(
        &mut self,
        supervisor_tx: mpsc::Sender<ControlMessage>,
        mut shutdown: ShutdownSignal,
    ) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());

        loop {
            let outcome = tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                outcome = self.session(&supervisor_tx) => outcome,
            };

            match outcome {
                Ok(()) => info!("delta feed ended, reconnecting"),
                Err(e) => {
                    error!("Delta feed failed: {}. Retrying in {:?}...", e, RECONNECT_DELAY);
                    supervisor_tx
                        .send(ControlMessage::Error(self.id, format!("Delta feed failed: {e}")))
                        .await?;

                    tokio::select! {
                        _ = shutdown_requested(&mut shutdown) => break,
                        _ = time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }

        info!("delta feed stopped");
        heartbeat_handle.abort();
        let _ = supervisor_tx.send(ControlMessage::Shutdown(self.id)).await;
        Ok(())
    }
}

impl<S: MarketSource + 'static> FeedGateway<S> {
    pub fn new(ws_url: &str, market: &str, coordinator: Arc<FeedCoordinator<S>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ws_url: ws_url.to_string(),
            market: market.to_lowercase(),
            coordinator,
        }
    }

    /// One connection, from handshake until the server closes it or asks
    /// for a reconnect. Order book synchronization runs inside the session
    /// and stops with it.
    async fn session(&self, supervisor_tx: &mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        info!("Connecting to: {}", self.ws_url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| FeedError::WebSocket(format!("connect {}: {e}", self.ws_url)))?;
        let (mut write, mut read) = ws_stream.split();

        let request = SubscribeRequest::diff_order_book(&self.market).to_json()?;
        write.send(Message::Text(request.into())).await?;
        self.coordinator.subscribe().await;

        let sync = self.synchronize_until_done();
        tokio::pin!(sync);
        let mut synchronized = false;

        loop {
            let msg = tokio::select! {
                _ = &mut sync, if !synchronized => {
                    synchronized = true;
                    continue;
                }
                msg = read.next() => msg,
            };

            let Some(msg) = msg else {
                return Ok(());
            };

            match msg.map_err(|e| FeedError::WebSocket(e.to_string()))? {
                Message::Text(text) => match parse_stream_message(&text) {
                    Ok(StreamEvent::Diff(update)) => {
                        self.coordinator.apply_delta(&update).await;
                    }
                    Ok(StreamEvent::Subscribed(channel)) => {
                        info!(%channel, "subscribed to delta channel");
                    }
                    Ok(StreamEvent::ReconnectRequested) => {
                        warn!("exchange requested a reconnect");
                        return Ok(());
                    }
                    Ok(StreamEvent::Ignored(event)) => {
                        debug!(%event, "ignoring feed event");
                    }
                    Err(e) => {
                        warn!(error = %e, "discarding malformed feed message");
                        supervisor_tx
                            .send(ControlMessage::Error(
                                self.id,
                                format!("Unknown socket response: {e}"),
                            ))
                            .await?;
                    }
                },
                Message::Ping(payload) => {
                    write.send(Message::Pong(payload)).await?;
                    debug!("Ping - Pong message sent to websocket.");
                }
                Message::Close(frame) => {
                    debug!(?frame, "Close message received");
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    async fn synchronize_until_done(&self) {
        loop {
            match self.coordinator.synchronize().await {
                Ok(()) => return,
                Err(e) => {
                    warn!(error = %e, retry_in = ?SYNC_RETRY_DELAY, "order book synchronization failed");
                    time::sleep(SYNC_RETRY_DELAY).await;
                }
            }
        }
    }
}
