//! Registry of live client channels.
//!
//! Both the per-connection lifecycle handler and the broadcast loop mutate the
//! registry, so every operation takes the lock for its full duration. The
//! broadcast loop iterates a [`ConnectionRegistry::snapshot`] and never the
//! live map.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Utf8Bytes;
use ledgercast_core::LedgercastResult;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identifier assigned to every accepted connection.
pub type ConnectionId = Uuid;

/// Outbound half of a client connection.
///
/// The payload is reference counted; clones share one encoded buffer.
#[async_trait]
pub trait PayloadSink: Send + Sync {
    async fn send_text(&self, payload: Utf8Bytes) -> LedgercastResult<()>;
}

/// Handle to one connection's send capability.
#[derive(Clone)]
pub struct ClientChannel {
    id: ConnectionId,
    sink: Arc<dyn PayloadSink>,
    closed: CancellationToken,
}

impl ClientChannel {
    pub fn new(sink: Arc<dyn PayloadSink>) -> Self {
        Self::with_cancellation(sink, CancellationToken::new())
    }

    /// Create a channel whose owner stops once `closed` is cancelled.
    pub fn with_cancellation(sink: Arc<dyn PayloadSink>, closed: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            sink,
            closed,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn send(&self, payload: Utf8Bytes) -> LedgercastResult<()> {
        self.sink.send_text(payload).await
    }

    /// Tell the connection's owner to shut it down.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl fmt::Debug for ClientChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientChannel").field("id", &self.id).finish()
    }
}

/// Set of currently connected clients.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    channels: Arc<RwLock<HashMap<ConnectionId, ClientChannel>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. Returns `false` if it was already registered.
    pub fn register(&self, channel: ClientChannel) -> bool {
        self.channels.write().insert(channel.id, channel).is_none()
    }

    /// Remove a channel. Returns `false` if it was already absent.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.channels.write().remove(&id).is_some()
    }

    /// Remove a channel and close its connection. Used when a send fails.
    pub fn evict(&self, channel: &ClientChannel) -> bool {
        channel.close();
        self.unregister(channel.id)
    }

    /// Register a channel for as long as the returned guard lives.
    pub fn register_scoped(&self, channel: ClientChannel) -> Registration {
        let id = channel.id;
        self.register(channel);
        Registration {
            registry: self.clone(),
            id,
        }
    }

    /// Point-in-time copy of the current members.
    pub fn snapshot(&self) -> Vec<ClientChannel> {
        self.channels.read().values().cloned().collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.channels.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }
}

/// Unregisters its channel when dropped.
#[must_use = "dropping the registration unregisters the channel immediately"]
pub struct Registration {
    registry: ConnectionRegistry,
    id: ConnectionId,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use ledgercast_core::LedgercastError;
    use parking_lot::Mutex;

    use super::*;

    /// Sink that records payloads and can be switched to fail.
    #[derive(Default)]
    pub struct RecordingSink {
        pub received: Mutex<Vec<Utf8Bytes>>,
        pub attempts: AtomicUsize,
        pub failing: AtomicBool,
    }

    impl RecordingSink {
        pub fn failing() -> Self {
            let sink = Self::default();
            sink.failing.store(true, Ordering::SeqCst);
            sink
        }

        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }

        pub fn payloads(&self) -> Vec<Utf8Bytes> {
            self.received.lock().clone()
        }
    }

    #[async_trait]
    impl PayloadSink for RecordingSink {
        async fn send_text(&self, payload: Utf8Bytes) -> LedgercastResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(LedgercastError::send("connection reset"));
            }
            self.received.lock().push(payload);
            Ok(())
        }
    }

    pub fn recording_channel() -> (ClientChannel, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (ClientChannel::new(sink.clone()), sink)
    }
}
