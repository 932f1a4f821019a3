//! Helpers for minting keys and tokens in tests and client tooling.

use chrono::Utc;
use k256::ecdsa::SigningKey;
use rand_core::OsRng;

use crate::crypto::{identity_hex, mint_tribe_token};
use crate::error::AuthResult;

/// Fresh random keypair with its hex identity.
pub fn generate_keypair() -> (SigningKey, String) {
    let key = SigningKey::random(&mut OsRng);
    let identity = identity_hex(key.verifying_key());
    (key, identity)
}

/// Tribe token stamped with the current time.
pub fn tribe_token_now(key: &SigningKey) -> AuthResult<String> {
    let now = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
    mint_tribe_token(key, now)
}

/// Tribe token stamped `offset_secs` away from now (negative means in the past).
pub fn tribe_token_offset(key: &SigningKey, offset_secs: i64) -> AuthResult<String> {
    let timestamp = Utc::now().timestamp().saturating_add(offset_secs);
    mint_tribe_token(key, u32::try_from(timestamp).unwrap_or(0))
}
