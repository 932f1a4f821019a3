//! Challenge-response login and the save/poll relay.
//!
//! A challenge starts life as `id -> issued-at` in the cache. A signed
//! submission overwrites it with the serialized [`VerifyPayload`], which the
//! polling client then reads back (as many times as it likes until expiry)
//! together with a freshly minted bearer credential.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::cache::KeyValueCache;
use crate::credential::CredentialIssuer;
use crate::error::{AuthError, AuthResult};
use crate::identity::IdentityStore;

/// Cached values this short still hold an issuance timestamp, not a payload.
const MIN_RESOLVED_LEN: usize = 10;

const SAVE_KEY_PREFIX: &str = "save:";

/// Body of a signed challenge submission and of a successful poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerifyPayload {
    pub id: u64,
    pub pubkey: String,
    pub contact_key: String,
    pub alias: String,
    pub photo_url: String,
    pub route_hint: String,
    pub price_to_meet: u64,
    pub jwt: String,
    pub url: String,
    pub description: String,
    pub verification_signature: String,
    pub extras: Option<Map<String, Value>>,
    pub tribe_jwt: String,
}

/// A request relayed through the cache for another client to pick up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SavePayload {
    pub key: String,
    pub body: String,
    pub path: String,
    pub method: String,
}

pub struct ChallengeService {
    cache: Arc<dyn KeyValueCache>,
    identities: Arc<dyn IdentityStore>,
    credentials: Arc<CredentialIssuer>,
    challenge_ttl: Duration,
    cache_ttl: Duration,
}

impl ChallengeService {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        identities: Arc<dyn IdentityStore>,
        credentials: Arc<CredentialIssuer>,
        challenge_ttl: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            identities,
            credentials,
            challenge_ttl,
            cache_ttl,
        }
    }

    /// Create a challenge and remember when it was issued.
    pub fn issue(&self) -> (String, i64) {
        let challenge = Uuid::new_v4().simple().to_string();
        let issued_at = Utc::now().timestamp();
        self.cache
            .set(&challenge, issued_at.to_string(), self.challenge_ttl);
        tracing::info!(%challenge, "challenge issued");
        (challenge, issued_at)
    }

    /// Attach `identity` to the submitted payload and store it under the challenge.
    ///
    /// The identity comes from the request's own credential; any `pubkey` in
    /// the body is ignored.
    pub fn submit(&self, challenge: &str, body: &[u8], identity: &str) -> AuthResult<()> {
        if self.cache.get(challenge).is_none() {
            tracing::debug!(%challenge, "submission for unknown challenge");
            return Err(AuthError::ChallengeNotFound);
        }

        let mut payload: VerifyPayload =
            serde_json::from_slice(body).map_err(|e| AuthError::MalformedBody(e.to_string()))?;
        payload.pubkey = identity.to_string();

        let serialized = serde_json::to_string(&payload)?;
        self.cache.set(challenge, serialized, self.challenge_ttl);
        tracing::info!(%challenge, identity, "challenge resolved");
        Ok(())
    }

    /// Read a resolved challenge, enrich it from the profile store and attach
    /// a bearer credential. The entry stays in place until it expires.
    pub fn poll(&self, challenge: &str) -> AuthResult<VerifyPayload> {
        let raw = self.cache.get(challenge).ok_or(AuthError::Unauthorized)?;
        if raw.len() <= MIN_RESOLVED_LEN {
            return Err(AuthError::Unauthorized);
        }

        let mut payload: VerifyPayload = serde_json::from_str(&raw).map_err(|e| {
            tracing::debug!(%challenge, error = %e, "unreadable challenge payload");
            AuthError::Unauthorized
        })?;
        if payload.pubkey.is_empty() {
            return Err(AuthError::Unauthorized);
        }

        let profile = self.identities.find_identity(&payload.pubkey);
        if let Some(profile) = &profile {
            payload.id = profile.id;
            payload.description = profile.description.clone();
            payload.extras = Some(profile.extras.clone());
            if !profile.img.is_empty() {
                payload.photo_url = profile.img.clone();
            }
            if !profile.owner_alias.is_empty() {
                payload.alias = profile.owner_alias.clone();
            }
        }

        payload.tribe_jwt = self.credentials.issue(&payload.pubkey)?;

        if let Some(profile) = profile {
            self.identities
                .record_last_seen(profile.id, Utc::now().timestamp());
        }

        Ok(payload)
    }

    /// Store a relay payload under its own key and return that key.
    pub fn save(&self, body: &[u8]) -> AuthResult<String> {
        let payload: SavePayload =
            serde_json::from_slice(body).map_err(|e| AuthError::MalformedBody(e.to_string()))?;
        let serialized = serde_json::to_string(&payload)?;
        self.cache
            .set(&save_key(&payload.key), serialized, self.cache_ttl);
        Ok(payload.key)
    }

    pub fn poll_save(&self, key: &str) -> AuthResult<SavePayload> {
        let raw = self
            .cache
            .get(&save_key(key))
            .ok_or(AuthError::Unauthorized)?;
        if raw.len() <= MIN_RESOLVED_LEN {
            return Err(AuthError::Unauthorized);
        }
        serde_json::from_str(&raw).map_err(|_| AuthError::Unauthorized)
    }
}

fn save_key(key: &str) -> String {
    format!("{SAVE_KEY_PREFIX}{key}")
}
