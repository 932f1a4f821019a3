//! Service configuration derived from environment variables.
//!
//! Configuration is loaded once at startup and validated before the service
//! starts. Tests build their own instance with [`Settings::for_tests`] and the
//! `with_*` builders instead of touching the process environment.
//!
//! ## Environment Variables
//! - `PORT`, `HOST`: bind address (default `[::]:5002`)
//! - `JWT_KEY`: symmetric key for bearer credentials (required)
//! - `CREDENTIAL_TTL_HOURS`: credential lifetime (default 168)
//! - `SUPER_ADMINS`: comma-separated identities allowed through the admin gate
//! - `ADMIN_STRINGS`: admin restriction string; empty means the free pass is on
//! - `ADMIN_DEV_FREE_PASS`: dev free-pass marker (see [`AccessPolicy`])
//! - `CONNECTION_AUTH`: static shared secret for the `token` header gate
//! - `CHALLENGE_TTL_SECS`, `CACHE_TTL_SECS`: cache lifetimes
//! - `BODY_LIMIT_KB`, `CONCURRENCY_LIMIT`: request limits
//! - `APP_ENV` / `RUST_ENV`: `production` enables strict validation

use std::env;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use zeroize::Zeroizing;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 5002;
const DEFAULT_BODY_LIMIT_KB: usize = 1024;
const DEFAULT_CONCURRENCY_LIMIT: usize = 4;
const CONCURRENCY_PER_CORE: usize = 64;
const DEFAULT_CREDENTIAL_TTL_HOURS: u64 = 24 * 7;
const DEFAULT_CHALLENGE_TTL_SECS: u64 = 600;
const DEFAULT_CACHE_TTL_SECS: u64 = 120;
/// Upper bound for every configured lifetime.
const MAX_TTL: Duration = Duration::from_secs(366 * 24 * 3600);
const MAX_CONCURRENCY_LIMIT: usize = 1_000_000;

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Who may pass the identity-policy gates.
///
/// Values are compared byte for byte: no trimming, no case folding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    super_admins: Vec<String>,
    admin_strings: String,
    dev_free_pass: String,
}

impl AccessPolicy {
    pub fn new(
        super_admins: Vec<String>,
        admin_strings: impl Into<String>,
        dev_free_pass: impl Into<String>,
    ) -> Self {
        Self {
            super_admins,
            admin_strings: admin_strings.into(),
            dev_free_pass: dev_free_pass.into(),
        }
    }

    /// True when the admin restriction string is empty, or when the only
    /// super admin is the (non-empty) dev free-pass marker.
    pub fn free_pass_active(&self) -> bool {
        if self.admin_strings.is_empty() {
            return true;
        }
        match self.super_admins.as_slice() {
            [only] => !self.dev_free_pass.is_empty() && *only == self.dev_free_pass,
            _ => false,
        }
    }

    pub fn is_super_admin(&self, identity: &str) -> bool {
        !identity.is_empty() && self.super_admins.iter().any(|admin| admin == identity)
    }

}

/// Secrets are wiped from memory when the settings are dropped.
#[derive(Clone)]
pub struct Settings {
    port: u16,
    host: IpAddr,
    body_limit_bytes: usize,
    concurrency_limit: usize,
    is_production: bool,
    jwt_key: Zeroizing<String>,
    credential_ttl: Duration,
    challenge_ttl: Duration,
    cache_ttl: Duration,
    connection_auth: Option<Zeroizing<String>>,
    access: AccessPolicy,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from any variable source. `from_env` passes the
    /// process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let raw = |name: &str| var(name).unwrap_or_default();
        let trimmed = |name: &str| raw(name).trim().to_string();

        let app_env = trimmed("APP_ENV").to_lowercase();
        let rust_env = trimmed("RUST_ENV").to_lowercase();
        let is_production = app_env == "production" || rust_env == "production";

        let port = trimmed("PORT").parse::<u16>().unwrap_or(DEFAULT_PORT);
        let host = trimmed("HOST")
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED));
        let body_limit_bytes = trimmed("BODY_LIMIT_KB")
            .parse::<usize>()
            .unwrap_or(DEFAULT_BODY_LIMIT_KB)
            .saturating_mul(1024);
        let concurrency_limit = trimmed("CONCURRENCY_LIMIT")
            .parse::<usize>()
            .ok()
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|value| value.get())
                    .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
                    .saturating_mul(CONCURRENCY_PER_CORE)
            });

        let credential_ttl_hours = trimmed("CREDENTIAL_TTL_HOURS")
            .parse::<u64>()
            .unwrap_or(DEFAULT_CREDENTIAL_TTL_HOURS);
        let challenge_ttl_secs = trimmed("CHALLENGE_TTL_SECS")
            .parse::<u64>()
            .unwrap_or(DEFAULT_CHALLENGE_TTL_SECS);
        let cache_ttl_secs = trimmed("CACHE_TTL_SECS")
            .parse::<u64>()
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        // Secrets and policy strings are matched byte for byte, so they are
        // read untrimmed.
        let connection_auth = var("CONNECTION_AUTH")
            .filter(|value| !value.is_empty())
            .map(Zeroizing::new);
        let access = AccessPolicy::new(
            parse_list(&raw("SUPER_ADMINS")),
            raw("ADMIN_STRINGS"),
            raw("ADMIN_DEV_FREE_PASS"),
        );

        Self {
            port,
            host,
            body_limit_bytes,
            concurrency_limit,
            is_production,
            jwt_key: Zeroizing::new(raw("JWT_KEY")),
            credential_ttl: Duration::from_secs(credential_ttl_hours.saturating_mul(3600)),
            challenge_ttl: Duration::from_secs(challenge_ttl_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            connection_auth,
            access,
        }
    }

    pub fn for_tests() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            body_limit_bytes: DEFAULT_BODY_LIMIT_KB * 1024,
            concurrency_limit: 32,
            is_production: false,
            jwt_key: Zeroizing::new("test-jwt-key".to_string()),
            credential_ttl: Duration::from_secs(DEFAULT_CREDENTIAL_TTL_HOURS * 3600),
            challenge_ttl: Duration::from_secs(DEFAULT_CHALLENGE_TTL_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            connection_auth: None,
            access: AccessPolicy::new(Vec::new(), "restricted", ""),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_key.is_empty() {
            return Err(ConfigError::MissingSecret("JWT_KEY"));
        }
        for (name, ttl) in [
            ("CREDENTIAL_TTL_HOURS", self.credential_ttl),
            ("CHALLENGE_TTL_SECS", self.challenge_ttl),
            ("CACHE_TTL_SECS", self.cache_ttl),
        ] {
            if ttl.is_zero() {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: "must be greater than zero".to_string(),
                });
            }
            if ttl > MAX_TTL {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: format!("must not exceed {} seconds", MAX_TTL.as_secs()),
                });
            }
        }
        if !(1..=MAX_CONCURRENCY_LIMIT).contains(&self.concurrency_limit) {
            return Err(ConfigError::InvalidValue {
                name: "CONCURRENCY_LIMIT",
                reason: format!("must be between 1 and {MAX_CONCURRENCY_LIMIT}"),
            });
        }
        if self.is_production && self.access.free_pass_active() {
            return Err(ConfigError::FreePassInProduction);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_bytes
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn is_production(&self) -> bool {
        self.is_production
    }

    pub fn jwt_key(&self) -> &str {
        self.jwt_key.as_str()
    }

    pub fn credential_ttl(&self) -> Duration {
        self.credential_ttl
    }

    pub fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn connection_auth(&self) -> Option<&str> {
        self.connection_auth.as_deref().map(String::as_str)
    }

    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    pub fn with_jwt_key(mut self, key: impl Into<String>) -> Self {
        self.jwt_key = Zeroizing::new(key.into());
        self
    }

    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_connection_auth(mut self, secret: Option<String>) -> Self {
        self.connection_auth = secret.map(Zeroizing::new);
        self
    }

    pub fn with_access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    pub fn with_production(mut self, is_production: bool) -> Self {
        self.is_production = is_production;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn policy(admins: &[&str], admin_strings: &str, free_pass: &str) -> AccessPolicy {
        AccessPolicy::new(
            admins.iter().map(ToString::to_string).collect(),
            admin_strings,
            free_pass,
        )
    }

    #[test]
    fn free_pass_when_admin_strings_empty() {
        assert!(policy(&["admin"], "", "freepass").free_pass_active());
        assert!(policy(&[], "", "freepass").free_pass_active());
        assert!(policy(&["freepass"], "", "freepass").free_pass_active());
    }

    #[test]
    fn free_pass_when_single_admin_is_marker() {
        assert!(policy(&["freepass"], "non-empty", "freepass").free_pass_active());
    }

    #[test]
    fn no_free_pass_otherwise() {
        assert!(!policy(&["freepass", "admin2"], "non-empty", "freepass").free_pass_active());
        assert!(!policy(&[], "non-empty", "freepass").free_pass_active());
        assert!(!policy(&["admin"], "non-empty", "freepass").free_pass_active());
        assert!(!policy(&[""], "non-empty", "freepass").free_pass_active());
        assert!(!policy(&["freepass"], "non-empty", "").free_pass_active());
        assert!(!policy(&[""], "non-empty", "").free_pass_active());

        let many = vec![String::new(); 1000];
        assert!(!AccessPolicy::new(many, "non-empty", "freepass").free_pass_active());
    }

    #[test]
    fn super_admin_match_is_exact() {
        let access = policy(&["admin1", "admin2", "admin3"], "x", "");
        assert!(access.is_super_admin("admin1"));
        assert!(!access.is_super_admin("admin"));
        assert!(!access.is_super_admin("admin1extra"));
        assert!(!access.is_super_admin("ADMIN1"));
        assert!(!access.is_super_admin(" admin1 "));
        assert!(!access.is_super_admin(""));
        assert!(!policy(&[], "x", "").is_super_admin("admin1"));
    }

    #[test]
    fn list_parsing_drops_blanks() {
        assert_eq!(parse_list("a, b,,c ,"), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_settings_validate() {
        assert!(Settings::for_tests().validate().is_ok());
    }

    #[test]
    fn missing_jwt_key_is_rejected() {
        let settings = Settings::for_tests().with_jwt_key("");
        assert_eq!(
            settings.validate(),
            Err(ConfigError::MissingSecret("JWT_KEY"))
        );
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let settings = Settings::for_tests().with_challenge_ttl(Duration::ZERO);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue {
                name: "CHALLENGE_TTL_SECS",
                ..
            })
        ));
    }

    #[test]
    fn free_pass_is_rejected_in_production() {
        let settings = Settings::for_tests()
            .with_production(true)
            .with_access(policy(&["admin"], "", ""));
        assert_eq!(settings.validate(), Err(ConfigError::FreePassInProduction));

        let settings = Settings::for_tests()
            .with_production(true)
            .with_access(policy(&["admin"], "restricted", ""));
        assert!(settings.validate().is_ok());
    }

    fn lookup(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn secrets_are_read_byte_for_byte() {
        let settings = lookup(&[("JWT_KEY", " s "), ("CONNECTION_AUTH", " s ")]);
        assert_eq!(settings.jwt_key(), " s ");
        assert_eq!(settings.connection_auth(), Some(" s "));

        let settings = lookup(&[("JWT_KEY", "key"), ("CONNECTION_AUTH", "")]);
        assert_eq!(settings.connection_auth(), None);
    }

    #[test]
    fn numeric_values_are_trimmed() {
        let settings = lookup(&[
            ("JWT_KEY", "key"),
            ("PORT", " 8080 "),
            ("CACHE_TTL_SECS", " 30"),
        ]);
        assert_eq!(settings.socket_addr().port(), 8080);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let huge = u64::MAX.to_string();
        let settings = lookup(&[("JWT_KEY", "key"), ("CACHE_TTL_SECS", huge.as_str())]);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue {
                name: "CACHE_TTL_SECS",
                ..
            })
        ));

        let settings = lookup(&[("JWT_KEY", "key"), ("CREDENTIAL_TTL_HOURS", huge.as_str())]);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue {
                name: "CREDENTIAL_TTL_HOURS",
                ..
            })
        ));

        let settings = Settings::for_tests().with_cache_ttl(MAX_TTL);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn concurrency_limit_is_bounded() {
        for limit in [0, MAX_CONCURRENCY_LIMIT + 1, usize::MAX] {
            let settings = Settings::for_tests().with_concurrency_limit(limit);
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::InvalidValue {
                    name: "CONCURRENCY_LIMIT",
                    ..
                })
            ));
        }

        let settings = lookup(&[("JWT_KEY", "key"), ("CONCURRENCY_LIMIT", "0")]);
        assert!(settings.validate().is_err());
        assert!(Settings::for_tests().with_concurrency_limit(1).validate().is_ok());
    }
}
