//! Liveness endpoint.
//!
//! Reports which access mode the gates are running in so operators can spot
//! a free pass or a missing shared secret without reading the environment.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "pubkey-auth-service";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    environment: &'static str,
    free_pass: bool,
    shared_secret_configured: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = &state.settings;
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        environment: if settings.is_production() {
            "production"
        } else {
            "development"
        },
        free_pass: settings.access().free_pass_active(),
        shared_secret_configured: settings.connection_auth().is_some(),
    })
}
