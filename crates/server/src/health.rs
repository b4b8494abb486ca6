use std::path::{Path, PathBuf};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    backup_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub backup_log: HealthCheck,
    pub checked_at: String,
}

pub fn router(backup_path: PathBuf) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { backup_path })
}

pub async fn spawn(bind_address: &str, port: u16, backup_path: PathBuf) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(serve_error) = axum::serve(listener, router(backup_path)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %serve_error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let backup_log = backup_check(&state.backup_path).await;
    let ready = backup_log.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "cotiza-server runtime initialized".to_string(),
        },
        backup_log,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// The backup log is the last line of defense for captured quotes, so a
/// non-writable path means the service cannot do its job safely.
async fn backup_check(path: &Path) -> HealthCheck {
    match OpenOptions::new().create(true).append(true).open(path).await {
        Ok(_) => HealthCheck { status: "ready", detail: "backup log writable".to_string() },
        Err(io_error) => HealthCheck {
            status: "degraded",
            detail: format!("backup log not writable: {io_error}"),
        },
    }
}
