//! Endpoints that only report whether a gate admitted the caller.

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::AuthenticatedIdentity;

pub async fn admin_auth(Extension(identity): Extension<AuthenticatedIdentity>) -> Json<Value> {
    Json(json!({ "pubkey": identity.0 }))
}

pub async fn connection_codes_auth() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn test_auth() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
