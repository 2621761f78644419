use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub live_backends: usize,
    pub total_backends: usize,
}

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub url: String,
    pub alive: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let live = state.pool.live_count();
    let total = state.pool.len();
    let status = match live {
        0 => "unavailable",
        n if n == total => "operational",
        _ => "degraded",
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status,
        live_backends: live,
        total_backends: total,
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let statuses = state
        .pool
        .backends()
        .iter()
        .map(|b| BackendStatus {
            url: b.url().to_string(),
            alive: b.is_alive(),
        })
        .collect();

    Json(statuses)
}
