//! Ledgercast Web Server
//!
//! Axum-based WebSocket server that pushes the transaction dataset to every
//! connected client on a fixed interval.

pub mod broadcast;
pub mod config;
pub mod registry;
pub mod routes;
pub mod state;
pub mod websocket;

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use ledgercast_core::{LedgercastResult, TransactionSource};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub use broadcast::{Broadcaster, TickReport};
pub use config::{BroadcastConfig, ServerConfig};
pub use registry::{ClientChannel, ConnectionId, ConnectionRegistry, PayloadSink};
pub use state::AppState;

/// Build the CORS policy. An empty allow-list admits any origin.
fn cors_layer(config: &ServerConfig) -> LedgercastResult<CorsLayer> {
    let origins = config.origin_header_values()?;
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Create the application router.
pub fn create_router(state: AppState, config: &ServerConfig) -> LedgercastResult<Router> {
    let cors = cors_layer(config)?;

    let api_routes = Router::new()
        .route("/transactions", get(routes::transactions::list_transactions))
        .route("/status", get(routes::status::get_status))
        .with_state(state.clone());

    Ok(Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Serve `app` on an already-bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Web server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Web server stopped");
    Ok(())
}

/// Run the web server and the broadcast loop until Ctrl+C or SIGTERM.
pub async fn run_server(
    config: ServerConfig,
    state: AppState,
    source: Arc<dyn TransactionSource>,
) -> anyhow::Result<()> {
    let app = create_router(state.clone(), &config)?;
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    let shutdown = state.shutdown.clone();
    let broadcast = state.broadcaster(source).spawn(shutdown.clone());

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let served = serve(listener, app, shutdown.clone()).await;
    // Stop the loop and any open sockets even if serving failed.
    shutdown.cancel();
    broadcast.await.context("broadcast loop panicked")?;

    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use ledgercast_core::transaction::seeded_dataset;
    use tower::ServiceExt;

    use super::*;
    use crate::registry::testing::recording_channel;

    fn app(config: &ServerConfig) -> (Router, AppState) {
        let state = AppState::new(seeded_dataset(), BroadcastConfig::default());
        (create_router(state.clone(), config).unwrap(), state)
    }

    #[tokio::test]
    async fn test_list_transactions_returns_seed() {
        let (app, _) = app(&ServerConfig::default());
        let response = app
            .oneshot(Request::get("/api/transactions").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let transactions: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(transactions.len(), 8);
        assert_eq!(transactions[1]["description"], "Salary Deposit");
    }

    #[tokio::test]
    async fn test_status_reports_clients_and_dataset() {
        let (app, state) = app(&ServerConfig::default());
        let (channel, _) = recording_channel();
        state.registry.register(channel);

        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(
            status,
            serde_json::json!({ "connected_clients": 1, "transactions": 8, "tick_secs": 5 })
        );
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        let (app, _) = app(&ServerConfig::default());
        let response = app
            .oneshot(
                Request::get("/api/status")
                    .header(header::ORIGIN, "http://client.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_cors_allow_list() {
        let config = ServerConfig {
            allowed_origins: vec!["http://allowed.example".into()],
            ..Default::default()
        };
        let (app, _) = app(&config);

        let allowed = app
            .clone()
            .oneshot(
                Request::get("/api/status")
                    .header(header::ORIGIN, "http://allowed.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://allowed.example"
        );

        let denied = app
            .oneshot(
                Request::get("/api/status")
                    .header(header::ORIGIN, "http://other.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_plain_get_on_ws_is_rejected() {
        let (app, state) = app(&ServerConfig::default());
        let response = app
            .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(state.registry.is_empty());
    }
}
