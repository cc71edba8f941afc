#![forbid(unsafe_code)]

//! Scramble keys
//!
//! Self-certifying, onion-style addresses derived from Ed25519 key pairs,
//! and a shallow key hierarchy built on top of them:
//! - Address derivation and verification
//! - Random, seeded, session and child key generation
//! - A key ring indexed by address
//! - JSON key files written without clobbering existing files
//!
//! Private key bytes are written to key files in plaintext. Protecting those
//! files is left to the caller.

pub mod address;
pub mod error;
pub mod key;
pub mod persist;
pub mod ring;

#[cfg(test)]
mod proptests;

pub use address::{derive_address, parse_address, to_display_address, verify_address};
pub use error::KeyError;
pub use key::{verify_signature, Key, KeyKind, KeyPair};
pub use persist::KeyDocument;
pub use ring::Ring;
