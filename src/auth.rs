//! Request gates placed in front of handlers.
//!
//! Each gate either calls the inner handler exactly once or short-circuits
//! with `401 {"error":"Unauthorized"}`. Gates that resolve an identity attach
//! it to the request as an [`AuthenticatedIdentity`] extension.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::credential::{CredentialClaims, CredentialIssuer};
use crate::crypto::verify_tribe_token;
use crate::error::{AuthError, AuthResult};
use crate::state::AppState;

/// Query parameter carrying a bearer credential or tribe token.
pub const TOKEN_QUERY_PARAM: &str = "token";
/// Header carrying a bearer credential or tribe token.
pub const TOKEN_HEADER: &str = "x-jwt";
/// Header compared against the configured shared secret.
pub const SHARED_SECRET_HEADER: &str = "token";

/// Identity resolved by a gate, available to handlers via `Extension`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedIdentity(pub String);

/// Which token format a presented token turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedToken {
    Bearer(CredentialClaims),
    Tribe(String),
}

impl ResolvedToken {
    pub fn identity(&self) -> &str {
        match self {
            Self::Bearer(claims) => &claims.pubkey,
            Self::Tribe(identity) => identity,
        }
    }
}

/// The `token` query parameter wins over the `x-jwt` header. Empty values
/// count as absent.
pub fn extract_token<B>(req: &Request<B>) -> Option<String> {
    let from_query = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(TOKEN_QUERY_PARAM))
        .filter(|token| !token.is_empty());
    if from_query.is_some() {
        return from_query;
    }

    req.headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

/// Decode as a bearer credential first, then as a tribe token with the
/// replay window enforced.
pub fn resolve_token(token: &str, credentials: &CredentialIssuer) -> AuthResult<ResolvedToken> {
    let bearer_err = match credentials.decode(token) {
        Ok(claims) => return Ok(ResolvedToken::Bearer(claims)),
        Err(err) => err,
    };

    match verify_tribe_token(token, true) {
        Ok(identity) => Ok(ResolvedToken::Tribe(identity)),
        Err(tribe_err) => Err(AuthError::UnrecognizedToken {
            bearer: bearer_err.to_string(),
            tribe: tribe_err.to_string(),
        }),
    }
}

fn authenticate<B>(state: &AppState, req: &Request<B>) -> AuthResult<String> {
    let token = extract_token(req).ok_or(AuthError::MissingToken)?;
    let resolved = resolve_token(&token, &state.credentials)?;
    let identity = resolved.identity();
    if identity.is_empty() {
        return Err(AuthError::Unauthorized);
    }
    Ok(identity.to_string())
}

fn reject<B>(req: &Request<B>, err: AuthError) -> Response {
    tracing::warn!(
        kind = ?err.kind(),
        error = %err,
        "Unauthorized request to {}",
        req.uri().path()
    );
    err.into_response()
}

/// Admit any request carrying a valid bearer credential or tribe token.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, &req) {
        Ok(identity) => {
            req.extensions_mut().insert(AuthenticatedIdentity(identity));
            next.run(req).await
        }
        Err(err) => reject(&req, err),
    }
}

/// Admit a resolved identity when it is a configured super admin, or when
/// the free pass is active.
pub async fn require_super_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let identity = match authenticate(&state, &req) {
        Ok(identity) => identity,
        Err(err) => return reject(&req, err),
    };

    let access = state.settings.access();
    if !access.free_pass_active() && !access.is_super_admin(&identity) {
        return reject(&req, AuthError::Unauthorized);
    }

    req.extensions_mut().insert(AuthenticatedIdentity(identity));
    next.run(req).await
}

/// Admit iff the `token` header equals the configured shared secret byte for
/// byte, compared in constant time. Nothing is admitted when no secret is
/// configured.
pub async fn require_shared_secret(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let provided = req
        .headers()
        .get(SHARED_SECRET_HEADER)
        .map(|value| value.as_bytes());

    let admitted = match (state.settings.connection_auth(), provided) {
        (Some(expected), Some(provided)) => bool::from(provided.ct_eq(expected.as_bytes())),
        _ => false,
    };

    if admitted {
        next.run(req).await
    } else {
        reject(&req, AuthError::Unauthorized)
    }
}

/// Admit unconditionally while the free pass is active; never looks at credentials.
pub async fn require_free_pass(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if state.settings.access().free_pass_active() {
        next.run(req).await
    } else {
        reject(&req, AuthError::Unauthorized)
    }
}
