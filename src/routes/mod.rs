//! HTTP route handlers.

pub mod admin;
pub mod challenge;
pub mod health;
pub mod save;

pub use admin::{admin_auth, connection_codes_auth, test_auth};
pub use challenge::{ask, poll, verify};
pub use health::health;
pub use save::{poll_save, post_save};
