//! Identity lookup used to enrich resolved challenges.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored profile for a known identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: u64,
    pub pubkey: String,
    pub owner_alias: String,
    pub img: String,
    pub description: String,
    pub extras: Map<String, Value>,
    pub last_login: i64,
}

/// Lookup-by-identity and last-login bookkeeping, backed by the profile store.
pub trait IdentityStore: Send + Sync {
    fn find_identity(&self, pubkey: &str) -> Option<Profile>;

    fn record_last_seen(&self, id: u64, timestamp: i64);
}

/// In-process store keyed by identity.
#[derive(Default)]
pub struct MemoryIdentityStore {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile) {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.pubkey.clone(), profile);
    }

    pub fn last_login(&self, pubkey: &str) -> Option<i64> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pubkey)
            .map(|profile| profile.last_login)
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn find_identity(&self, pubkey: &str) -> Option<Profile> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pubkey)
            .cloned()
    }

    fn record_last_seen(&self, id: u64, timestamp: i64) {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(profile) = profiles.values_mut().find(|profile| profile.id == id) {
            profile.last_login = timestamp;
        }
    }
}
