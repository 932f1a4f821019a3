//! Bearer credentials: HS256 JWTs carrying the subject identity.
//!
//! The signing key is fixed at construction and shared read-only across
//! requests.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Claims carried by a bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialClaims {
    /// Subject identity (hex compressed public key)
    pub pubkey: String,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    #[serde(default)]
    pub iat: i64,
    /// Not valid before (unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Identities must be non-empty ASCII alphanumerics before a credential is minted.
pub fn validate_identity(identity: &str) -> AuthResult<()> {
    if identity.is_empty() || !identity.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(AuthError::InvalidIdentity);
    }
    Ok(())
}

#[derive(Clone)]
pub struct CredentialIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl CredentialIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Mint a credential for `identity`, valid for the configured TTL.
    pub fn issue(&self, identity: &str) -> AuthResult<String> {
        validate_identity(identity)?;

        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = CredentialClaims {
            pubkey: identity.to_string(),
            exp: now.saturating_add(ttl),
            iat: now,
            nbf: None,
        };
        self.encode_claims(&claims)
    }

    pub fn encode_claims(&self, claims: &CredentialClaims) -> AuthResult<String> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    /// Validate signature, expiry and not-before, returning the claims.
    pub fn decode(&self, token: &str) -> AuthResult<CredentialClaims> {
        let data = decode::<CredentialClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(b"mock-jwt-key", Duration::from_secs(3600))
    }

    fn claims(pubkey: &str, exp_offset: i64, nbf_offset: Option<i64>) -> CredentialClaims {
        let now = Utc::now().timestamp();
        CredentialClaims {
            pubkey: pubkey.to_string(),
            exp: now + exp_offset,
            iat: now,
            nbf: nbf_offset.map(|offset| now + offset),
        }
    }

    #[test]
    fn issued_credential_round_trips() {
        let issuer = issuer();
        let token = issuer.issue("validPublicKey").unwrap();
        let decoded = issuer.decode(&token).unwrap();

        assert_eq!(decoded.pubkey, "validPublicKey");
        assert!(decoded.exp > Utc::now().timestamp());
    }

    #[test]
    fn identity_allow_list() {
        assert!(validate_identity("a").is_ok());
        assert!(validate_identity("02abcdef0123").is_ok());
        assert!(matches!(
            validate_identity(""),
            Err(AuthError::InvalidIdentity)
        ));
        assert!(matches!(
            validate_identity("invalidPublicKey!"),
            Err(AuthError::InvalidIdentity)
        ));
        assert!(issuer().issue("with space").is_err());
    }

    #[test]
    fn expired_credential_is_rejected() {
        let issuer = issuer();
        let token = issuer.encode_claims(&claims("pk", -3600, None)).unwrap();
        assert!(matches!(issuer.decode(&token), Err(AuthError::Credential(_))));
    }

    #[test]
    fn future_not_before_is_rejected() {
        let issuer = issuer();
        let token = issuer
            .encode_claims(&claims("pk", 3600, Some(3600)))
            .unwrap();
        assert!(issuer.decode(&token).is_err());
    }

    #[test]
    fn wrong_key_is_rejected() {
        let other = CredentialIssuer::new(b"wrongkey", Duration::from_secs(60));
        let token = other.issue("pk").unwrap();
        assert!(issuer().decode(&token).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let issuer = issuer();
        for token in ["", "header.payload", "randomstring", "null", "invalid.jwt.token"] {
            assert!(issuer.decode(token).is_err(), "accepted {token:?}");
        }
    }

    #[test]
    fn unsigned_token_is_rejected() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims("pk", 3600, None)).unwrap(),
        );
        let token = format!("{header}.{payload}.");
        assert!(issuer().decode(&token).is_err());
    }

    #[test]
    fn unknown_claims_are_ignored() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "pubkey": "pk", "exp": now + 60, "roles": ["admin"] }),
            &EncodingKey::from_secret(b"mock-jwt-key"),
        )
        .unwrap();
        let decoded = issuer.decode(&token).unwrap();
        assert_eq!(decoded.pubkey, "pk");
        assert_eq!(decoded.iat, 0);
    }
}
