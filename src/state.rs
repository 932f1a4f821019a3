//! Shared application state handed to handlers and middleware.

use std::sync::Arc;

use crate::cache::KeyValueCache;
use crate::challenge::ChallengeService;
use crate::credential::CredentialIssuer;
use crate::identity::IdentityStore;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub credentials: Arc<CredentialIssuer>,
    pub challenges: Arc<ChallengeService>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        cache: Arc<dyn KeyValueCache>,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        let credentials = Arc::new(CredentialIssuer::new(
            settings.jwt_key().as_bytes(),
            settings.credential_ttl(),
        ));
        let challenges = Arc::new(ChallengeService::new(
            cache,
            identities,
            credentials.clone(),
            settings.challenge_ttl(),
            settings.cache_ttl(),
        ));

        Self {
            settings: Arc::new(settings),
            credentials,
            challenges,
        }
    }
}
