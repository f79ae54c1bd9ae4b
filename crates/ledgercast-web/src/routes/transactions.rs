//! Transaction route handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::state::AppState;

/// Current dataset, encoded exactly as it is pushed over the socket.
pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let payload = state
        .dataset
        .read()
        .await
        .to_payload()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], payload))
}
