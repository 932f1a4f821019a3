//! Self-signed, time-stamped tokens.
//!
//! Layout before encoding: 4-byte big-endian unix timestamp followed by a
//! compact signature over `SIGNED_MSG_PREFIX || timestamp_bytes`. The wire
//! form is padded URL-safe base64, optionally preceded by a single `.`.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use chrono::Utc;
use k256::ecdsa::SigningKey;

use super::signature::{sign, verify_and_recover};
use crate::error::{AuthError, AuthResult};

/// Tokens older than this many seconds are rejected when the window is checked.
pub const REPLAY_WINDOW_SECS: i64 = 300;

const TIMESTAMP_LEN: usize = 4;
const LEADING_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    pub timestamp: u32,
    /// Always the raw big-endian bytes, whether or not a separator was present.
    pub timestamp_bytes: [u8; TIMESTAMP_LEN],
    pub signature: Vec<u8>,
}

/// Split a token into its timestamp and signature parts.
pub fn parse_token(text: &str) -> AuthResult<ParsedToken> {
    let encoded = text.strip_prefix(LEADING_SEPARATOR).unwrap_or(text);
    let raw = URL_SAFE.decode(encoded)?;
    if raw.len() <= TIMESTAMP_LEN {
        return Err(AuthError::TokenTooShort);
    }

    let (head, signature) = raw.split_at(TIMESTAMP_LEN);
    let mut timestamp_bytes = [0u8; TIMESTAMP_LEN];
    timestamp_bytes.copy_from_slice(head);

    Ok(ParsedToken {
        timestamp: u32::from_be_bytes(timestamp_bytes),
        timestamp_bytes,
        signature: signature.to_vec(),
    })
}

/// Verify a token and return the signer's identity.
pub fn verify_tribe_token(text: &str, check_replay_window: bool) -> AuthResult<String> {
    verify_tribe_token_at(text, check_replay_window, Utc::now().timestamp())
}

/// Same as [`verify_tribe_token`] with an explicit notion of "now" (unix seconds).
pub fn verify_tribe_token_at(text: &str, check_replay_window: bool, now: i64) -> AuthResult<String> {
    let parsed = parse_token(text)?;
    let (identity, _) = verify_and_recover(&parsed.timestamp_bytes, &parsed.signature)?;

    if check_replay_window {
        check_window(i64::from(parsed.timestamp), now)?;
    }

    Ok(identity)
}

/// Closed window `[now - REPLAY_WINDOW_SECS, now]`.
fn check_window(timestamp: i64, now: i64) -> AuthResult<()> {
    if timestamp > now {
        return Err(AuthError::TooEarly);
    }
    if timestamp < now - REPLAY_WINDOW_SECS {
        return Err(AuthError::TooLate);
    }
    Ok(())
}

/// Client side of the codec: sign `timestamp` and encode the token.
pub fn mint_tribe_token(key: &SigningKey, timestamp: u32) -> AuthResult<String> {
    let timestamp_bytes = timestamp.to_be_bytes();
    let signature = sign(Some(timestamp_bytes.as_slice()), key)?;

    let mut raw = Vec::with_capacity(TIMESTAMP_LEN + signature.len());
    raw.extend_from_slice(&timestamp_bytes);
    raw.extend_from_slice(&signature);
    Ok(URL_SAFE.encode(raw))
}
