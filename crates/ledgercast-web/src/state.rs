//! Application state.

use std::sync::Arc;

use ledgercast_core::{Dataset, TransactionSource};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::broadcast::Broadcaster;
use crate::config::BroadcastConfig;
use crate::registry::ConnectionRegistry;

/// Dataset shared between the broadcast loop and HTTP readers.
pub type SharedDataset = Arc<RwLock<Dataset>>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dataset: SharedDataset,
    pub registry: ConnectionRegistry,
    pub broadcast: BroadcastConfig,
    /// Cancelled once on process shutdown.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(dataset: Dataset, broadcast: BroadcastConfig) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(dataset)),
            registry: ConnectionRegistry::new(),
            broadcast,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build the broadcast loop over this state's dataset and registry.
    pub fn broadcaster(&self, source: Arc<dyn TransactionSource>) -> Broadcaster {
        Broadcaster::new(
            self.dataset.clone(),
            self.registry.clone(),
            source,
            self.broadcast,
        )
    }
}
