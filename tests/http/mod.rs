//! HTTP test utilities for pubkey auth integration tests.
//!
//! Provides a test app builder that mirrors the production router setup
//! while allowing configurable access policy and secrets.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};

use pubkey_auth_service::{
    app::build_router,
    cache::MemoryCache,
    credential::CredentialIssuer,
    identity::{MemoryIdentityStore, Profile},
    settings::{AccessPolicy, Settings},
    state::AppState,
};

/// Builder for creating test routers with configurable policy.
pub struct TestAppBuilder {
    settings: Settings,
    identities: Arc<MemoryIdentityStore>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::for_tests(),
            identities: Arc::new(MemoryIdentityStore::new()),
        }
    }

    pub fn with_connection_auth(mut self, secret: &str) -> Self {
        self.settings = self
            .settings
            .with_connection_auth(Some(secret.to_string()));
        self
    }

    pub fn with_access(
        mut self,
        super_admins: &[&str],
        admin_strings: &str,
        free_pass: &str,
    ) -> Self {
        let access = AccessPolicy::new(
            super_admins.iter().map(ToString::to_string).collect(),
            admin_strings,
            free_pass,
        );
        self.settings = self.settings.with_access(access);
        self
    }

    pub fn with_profile(self, profile: Profile) -> Self {
        self.identities.insert(profile);
        self
    }

    /// Shared handle to the profile store backing the built router.
    pub fn identities(&self) -> Arc<MemoryIdentityStore> {
        self.identities.clone()
    }

    pub fn build(self) -> Router {
        let state = AppState::new(
            self.settings,
            Arc::new(MemoryCache::new()),
            self.identities,
        );
        build_router(state)
    }
}

/// Create a test router with the default (restricted, no free pass) policy.
pub fn test_app() -> Router {
    TestAppBuilder::new().build()
}

/// Issuer matching the key used by [`Settings::for_tests`].
pub fn test_issuer() -> CredentialIssuer {
    let settings = Settings::for_tests();
    CredentialIssuer::new(settings.jwt_key().as_bytes(), settings.credential_ttl())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_header(uri: &str, name: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_json_body(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Helper to get response status and body as string (for debugging).
pub async fn response_debug(response: Response) -> (StatusCode, String) {
    use http_body_util::BodyExt;

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&body).to_string();
    (status, text)
}
