//! Server status route.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub connected_clients: usize,
    pub transactions: usize,
    pub tick_secs: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        connected_clients: state.registry.len(),
        transactions: state.dataset.read().await.len(),
        tick_secs: state.broadcast.tick_interval.as_secs(),
    })
}
