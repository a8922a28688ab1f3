//! Axum-based HTTP trigger
//!
//! An external timer (cloud scheduler, cron with curl, ...) hits
//! `/api/reconcile` once a minute; each request is one independent
//! invocation.

use crate::clock::{Clock, resolve_now};
use crate::device::DeviceConnector;
use crate::reconciler::Reconciler;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono_tz::Tz;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub connector: Arc<dyn DeviceConnector>,
    pub clock: Arc<dyn Clock>,
    pub tz: Tz,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Run one reconciliation; 200 on success, 500 on failure
pub async fn reconcile(State(state): State<AppState>) -> impl IntoResponse {
    let now = resolve_now(state.clock.as_ref(), state.tz);
    let outcome = state.reconciler.run(&now, state.connector.as_ref()).await;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(serde_json::json!({
            "success": outcome.is_success(),
            "message": outcome.summary(),
            "outcome": outcome,
            "local_time": now.to_rfc3339(),
        })),
    )
}

pub async fn schedule(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "timezone": state.tz.name(),
        "entries": state.reconciler.schedule().entries(),
    }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/reconcile", get(reconcile).post(reconcile))
        .route("/api/schedule", get(schedule))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);
    let logger = crate::logging::get_logger("web");

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "HTTP trigger listening at http://{}:{} (POST /api/reconcile)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    logger.info("HTTP trigger stopped");
    Ok(())
}
