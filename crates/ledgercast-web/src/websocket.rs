//! WebSocket handler for real-time transaction pushes.
//!
//! The handler only registers the connection and watches for it to end,
//! either from the peer side or because the channel was closed on shutdown or
//! after a failed send. All outbound data comes from the broadcast loop.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use ledgercast_core::{LedgercastError, LedgercastResult};
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, info, warn};

use crate::registry::{ClientChannel, PayloadSink};
use crate::state::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_failed_upgrade(|error| warn!(%error, "WebSocket upgrade failed"))
        .on_upgrade(|socket| handle_socket(socket, state))
}

/// Why a connection's lifecycle ended.
#[derive(Debug)]
enum Disconnect {
    PeerClosed,
    StreamEnded,
    Error,
    /// Dropped by the broadcast loop after a failed send.
    Evicted,
    Shutdown,
}

/// Outbound half of an upgraded socket.
struct WsSink {
    sender: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsSink {
    fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }

    /// Best-effort close frame.
    async fn close(&self) {
        if let Err(e) = self.sender.lock().await.close().await {
            debug!(error = %e, "WebSocket close failed");
        }
    }
}

#[async_trait]
impl PayloadSink for WsSink {
    async fn send_text(&self, payload: Utf8Bytes) -> LedgercastResult<()> {
        self.sender
            .lock()
            .await
            .send(Message::Text(payload))
            .await
            .map_err(|e| LedgercastError::send(e.to_string()))
    }
}

/// Handle individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let sink = Arc::new(WsSink::new(sender));

    // Cancelled on shutdown, or by the broadcast loop when a send fails.
    let closed = state.shutdown.child_token();
    let channel = ClientChannel::with_cancellation(sink.clone(), closed.clone());
    let registration = state.registry.register_scoped(channel);
    let conn_id = registration.id();
    info!(
        %conn_id,
        connected_clients = state.registry.len(),
        "WebSocket client connected"
    );

    let reason = tokio::select! {
        _ = closed.cancelled() => {
            if state.shutdown.is_cancelled() {
                Disconnect::Shutdown
            } else {
                Disconnect::Evicted
            }
        }
        reason = wait_for_disconnect(&mut receiver) => reason,
    };

    drop(registration);
    if matches!(reason, Disconnect::Shutdown | Disconnect::Evicted) {
        let timeout = state.broadcast.send_timeout;
        if time::timeout(timeout, sink.close()).await.is_err() {
            debug!(%conn_id, "WebSocket close timed out");
        }
    }

    info!(
        %conn_id,
        ?reason,
        connected_clients = state.registry.len(),
        "WebSocket client disconnected"
    );
}

/// Drain inbound frames until the peer goes away.
async fn wait_for_disconnect(receiver: &mut SplitStream<WebSocket>) -> Disconnect {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => return Disconnect::PeerClosed,
            Ok(Message::Text(text)) => {
                debug!(len = text.len(), "Ignoring text frame from WebSocket client");
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "WebSocket receive failed");
                return Disconnect::Error;
            }
        }
    }
    Disconnect::StreamEnded
}
