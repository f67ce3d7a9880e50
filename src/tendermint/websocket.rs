//! WebSocket client for the Tendermint RPC event stream

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, instrument, warn};

use super::messages::{extract_reserves, message_id, RpcRequest};
use crate::common::errors::{Result, TraderError};
use crate::common::types::{ConnectionStatus, PoolEvent};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Keep-alive query reissued on every heartbeat tick
const HEARTBEAT_QUERY: &str = "tm.event='NewBlock'";

/// An outstanding subscribe/heartbeat request awaiting acknowledgement
///
/// Stale entries are swept, never retried; the connection's heartbeat and
/// reconnect loop is the recovery mechanism.
#[derive(Debug, Clone)]
struct PendingRequest {
    description: &'static str,
    sent_at: Instant,
}

/// Long-lived client for a single logical subscription to pool swap events
///
/// Owns the connect/subscribe/heartbeat/reconnect loop and forwards extracted
/// reserve strings into the decision pipeline, exactly once per message.
pub struct TendermintWsClient {
    /// WebSocket URL (including the `/websocket` path)
    url: String,
    /// Subscription filter query
    query: String,
    /// Heartbeat subscribe interval
    heartbeat_interval: Duration,
    /// Age after which outstanding requests are dropped
    pending_timeout: Duration,
    /// Fixed delay between reconnect attempts
    reconnect_delay: Duration,
    /// Monotonic request id counter
    next_id: u64,
    /// Outstanding requests by id
    pending: HashMap<String, PendingRequest>,
    /// Connected state flag
    is_connected: Arc<AtomicBool>,
}

impl TendermintWsClient {
    /// Create a new client for the given endpoint and filter query
    pub fn new(url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: query.into(),
            heartbeat_interval: Duration::from_secs(15),
            pending_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(2),
            next_id: 1,
            pending: HashMap::new(),
            is_connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the heartbeat, pending-sweep and reconnect timing
    pub fn with_timing(
        mut self,
        heartbeat_interval: Duration,
        pending_timeout: Duration,
        reconnect_delay: Duration,
    ) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self.pending_timeout = pending_timeout;
        self.reconnect_delay = reconnect_delay;
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    /// Shared handle to the connected flag, for external observation
    pub fn connected_handle(&self) -> Arc<AtomicBool> {
        self.is_connected.clone()
    }

    /// Run the connection loop indefinitely
    ///
    /// Connection failures are always recoverable: after any close or error the
    /// client waits out the fixed reconnect delay and dials again, with no
    /// backoff growth and no attempt limit. The loop only ends when the event
    /// receiver has been dropped.
    #[instrument(skip(self, sender), fields(url = %self.url))]
    pub async fn run(mut self, sender: mpsc::Sender<PoolEvent>) {
        loop {
            match self.run_connection(&sender).await {
                Ok(()) => info!("WebSocket closed by peer"),
                Err(e) => warn!("WebSocket error: {}", e),
            }
            self.is_connected.store(false, Ordering::SeqCst);

            if sender.is_closed() {
                info!("Event receiver dropped, stopping stream client");
                return;
            }

            let _ = sender
                .send(PoolEvent::ConnectionStatus(ConnectionStatus::Reconnecting))
                .await;
            info!(
                "Reconnecting in {}ms...",
                self.reconnect_delay.as_millis()
            );
            sleep(self.reconnect_delay).await;
        }
    }

    /// Drive one connection from dial to close
    async fn run_connection(&mut self, sender: &mpsc::Sender<PoolEvent>) -> Result<()> {
        info!("Connecting to Tendermint WebSocket: {}", self.url);
        let (ws_stream, _response) = connect_async(&self.url)
            .await
            .map_err(|e| TraderError::WebSocketConnection(e.to_string()))?;

        info!("WebSocket connection established");
        self.is_connected.store(true, Ordering::SeqCst);
        // Any unacknowledged subscription state died with the old connection.
        self.pending.clear();

        let _ = sender
            .send(PoolEvent::ConnectionStatus(ConnectionStatus::Connected))
            .await;

        let (mut write, mut read) = ws_stream.split();

        self.send_request(&mut write, &self.query.clone(), "subscribe")
            .await?;

        let mut heartbeat = interval_at(
            (Instant::now() + self.heartbeat_interval).into(),
            self.heartbeat_interval,
        );

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_message(&text, sender).await?;
                        }
                        Some(Ok(Message::Ping(_))) => {
                            debug!("Received Ping");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!("WebSocket closed: {:?}", frame);
                            let _ = sender
                                .send(PoolEvent::ConnectionStatus(ConnectionStatus::Disconnected(
                                    frame.map(|f| f.reason.to_string()),
                                )))
                                .await;
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            error!("WebSocket error: {}", e);
                            let _ = sender
                                .send(PoolEvent::ConnectionStatus(ConnectionStatus::Error(
                                    e.to_string(),
                                )))
                                .await;
                            return Err(e.into());
                        }
                        None => {
                            info!("WebSocket stream ended");
                            let _ = sender
                                .send(PoolEvent::ConnectionStatus(ConnectionStatus::Disconnected(
                                    None,
                                )))
                                .await;
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                _ = heartbeat.tick() => {
                    self.send_request(&mut write, HEARTBEAT_QUERY, "heartbeat").await?;
                    self.sweep_pending();
                    let _ = sender.send(PoolEvent::Heartbeat).await;
                }
            }
        }
    }

    /// Handle one incoming text frame
    ///
    /// Malformed payloads are dropped without error. A matching pending id is
    /// cleared; a recognized reserve-update event is forwarded synchronously,
    /// exactly once, before the next frame is read.
    async fn handle_message(
        &mut self,
        text: &str,
        sender: &mpsc::Sender<PoolEvent>,
    ) -> Result<()> {
        let msg: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                debug!("Ignoring malformed message: {}", e);
                return Ok(());
            }
        };

        if let Some(id) = message_id(&msg) {
            if let Some(req) = self.pending.remove(&id) {
                debug!("Request {} ({}) acknowledged", id, req.description);
            }
        }

        if let Some(reserves) = extract_reserves(&msg) {
            sender
                .send(PoolEvent::ReserveUpdate { reserves })
                .await
                .map_err(|e| TraderError::ChannelSend(e.to_string()))?;
        }

        Ok(())
    }

    /// Send a subscribe request and track it as pending
    async fn send_request(
        &mut self,
        write: &mut WsSink,
        query: &str,
        description: &'static str,
    ) -> Result<()> {
        let id = self.next_id.to_string();
        self.next_id += 1;

        let request = RpcRequest::subscribe(id.clone(), query);
        let payload = serde_json::to_string(&request)?;
        debug!("Sending {} request: {}", description, payload);
        write.send(Message::Text(payload)).await?;

        self.pending.insert(
            id,
            PendingRequest {
                description,
                sent_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Drop pending requests older than the configured timeout
    fn sweep_pending(&mut self) {
        let timeout = self.pending_timeout;
        self.pending.retain(|id, req| {
            let keep = req.sent_at.elapsed() <= timeout;
            if !keep {
                debug!("Dropping stale request {} ({})", id, req.description);
            }
            keep
        });
    }
}
