//! Save relay: one client stores a request, another picks it up by key.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::challenge::SavePayload;
use crate::error::AuthError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SaveResponse {
    key: String,
}

#[tracing::instrument(skip(state, body), fields(request_bytes = body.len()))]
pub async fn post_save(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, AuthError> {
    let key = state.challenges.save(&body)?;
    Ok(Json(SaveResponse { key }))
}

#[tracing::instrument(skip(state))]
pub async fn poll_save(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SavePayload>, AuthError> {
    Ok(Json(state.challenges.poll_save(&key)?))
}
