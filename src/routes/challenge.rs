//! Challenge-response login endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::AuthenticatedIdentity;
use crate::challenge::VerifyPayload;
use crate::error::AuthError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AskResponse {
    challenge: String,
    /// Issuance time in unix seconds, as a decimal string.
    ts: String,
}

#[tracing::instrument(skip(state))]
pub async fn ask(State(state): State<AppState>) -> Json<AskResponse> {
    let (challenge, issued_at) = state.challenges.issue();
    Json(AskResponse {
        challenge,
        ts: issued_at.to_string(),
    })
}

/// The body is read raw so that an unknown challenge is reported before a
/// malformed body.
#[tracing::instrument(skip(state, identity, body), fields(request_bytes = body.len()))]
pub async fn verify(
    State(state): State<AppState>,
    Path(challenge): Path<String>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    body: Bytes,
) -> Result<Json<Value>, AuthError> {
    state.challenges.submit(&challenge, &body, &identity.0)?;
    Ok(Json(json!({})))
}

#[tracing::instrument(skip(state))]
pub async fn poll(
    State(state): State<AppState>,
    Path(challenge): Path<String>,
) -> Result<Json<VerifyPayload>, AuthError> {
    Ok(Json(state.challenges.poll(&challenge)?))
}
