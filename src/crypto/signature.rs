//! Recoverable secp256k1 signatures over prefixed messages.
//!
//! Wire format is the 65-byte "compact" layout: one header byte
//! (`27 + recovery_id`, plus 4 when the key is compressed) followed by the
//! 32-byte `r` and 32-byte `s` scalars. The signed digest is
//! `sha256(sha256(SIGNED_MSG_PREFIX || message))`.
//!
//! Verification never takes a public key as input: the signer's key is
//! recovered from the signature and returned as the identity.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::{Digest, Sha256};

use crate::error::{AuthError, AuthResult};

/// Prefix prepended to every signed payload.
pub const SIGNED_MSG_PREFIX: &[u8] = b"Lightning Signed Message:";

/// Length of a compact recoverable signature.
pub const COMPACT_SIGNATURE_LEN: usize = 65;

const HEADER_BASE: u8 = 27;
const HEADER_COMPRESSED: u8 = 4;

/// Double SHA-256 over `SIGNED_MSG_PREFIX || message`.
pub fn signed_message_digest(message: &[u8]) -> [u8; 32] {
    let first = Sha256::new()
        .chain_update(SIGNED_MSG_PREFIX)
        .chain_update(message)
        .finalize();
    Sha256::digest(first).into()
}

/// Hex encoding of the compressed SEC1 public key.
pub fn identity_hex(key: &VerifyingKey) -> String {
    hex::encode(key.as_affine().to_encoded_point(true).as_bytes())
}

/// Produce a compact recoverable signature.
///
/// `None` is rejected with [`AuthError::EmptyMessage`]; an empty slice is a
/// valid message.
pub fn sign(message: Option<&[u8]>, key: &SigningKey) -> AuthResult<[u8; COMPACT_SIGNATURE_LEN]> {
    let message = message.ok_or(AuthError::EmptyMessage)?;
    let digest = signed_message_digest(message);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

    let mut compact = [0u8; COMPACT_SIGNATURE_LEN];
    compact[0] = HEADER_BASE + HEADER_COMPRESSED + recovery_id.to_byte();
    compact[1..].copy_from_slice(&signature.to_bytes());
    Ok(compact)
}

/// Recover the signer of `message` and return its identity.
///
/// The boolean is always `true` on success; a signature either recovers to a
/// key or the call fails.
pub fn verify_and_recover(message: &[u8], signature: &[u8]) -> AuthResult<(String, bool)> {
    if signature.len() != COMPACT_SIGNATURE_LEN {
        return Err(AuthError::InvalidSignatureSize);
    }

    let header = signature[0];
    if !(HEADER_BASE..HEADER_BASE + 8).contains(&header) {
        return Err(AuthError::InvalidSignature(format!(
            "invalid recovery header {header}"
        )));
    }
    let recovery_id = RecoveryId::from_byte((header - HEADER_BASE) & 3)
        .ok_or_else(|| AuthError::InvalidSignature("invalid recovery id".to_string()))?;

    let parsed = Signature::from_slice(&signature[1..])
        .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
    // High-s signatures recover the same key once normalized and the parity flipped.
    let (parsed, recovery_id) = match parsed.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (parsed, recovery_id),
    };

    let digest = signed_message_digest(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &parsed, recovery_id)
        .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

    Ok((identity_hex(&key), true))
}

/// Verify a URL-safe base64 signature over an arbitrary message.
pub fn verify_arbitrary(signature_b64: &str, message: &str) -> AuthResult<String> {
    let signature = URL_SAFE.decode(signature_b64)?;
    let (identity, _) = verify_and_recover(message.as_bytes(), &signature)?;
    Ok(identity)
}
