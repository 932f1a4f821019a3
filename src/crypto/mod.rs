//! Signature engine and self-signed token codec.

pub mod signature;
pub mod tribe_token;

pub use signature::{
    identity_hex, sign, signed_message_digest, verify_and_recover, verify_arbitrary,
    COMPACT_SIGNATURE_LEN, SIGNED_MSG_PREFIX,
};
pub use tribe_token::{
    mint_tribe_token, parse_token, verify_tribe_token, verify_tribe_token_at, ParsedToken,
    REPLAY_WINDOW_SECS,
};
