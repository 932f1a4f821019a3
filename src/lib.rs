//! Pubkey Authentication Service Library
//!
//! Recoverable secp256k1 signatures, self-signed tribe tokens, bearer
//! credentials and the challenge-response login flow, plus the axum gates
//! that admit requests based on them.
//!
//! The binary in `main.rs` wires these into an HTTP service; integration
//! tests drive the same router through [`app::build_router`].

pub mod app;
pub mod auth;
pub mod cache;
pub mod challenge;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod routes;
pub mod settings;
pub mod state;
pub mod telemetry;
pub mod test_support;
