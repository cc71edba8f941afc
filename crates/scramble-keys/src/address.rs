//! Onion-style address codec.
//!
//! An address is `base32(public_key || checksum[..2] || version)` in lower
//! case, where `checksum = SHA3-256(".onion checksum" || public_key || version)`.
//! Anyone holding the public key can recompute the address, and anyone
//! holding the address can recover the public key and check the checksum.

use data_encoding::BASE32;
use sha3::{Digest, Sha3_256};

use crate::error::KeyError;

/// Domain separation prefix hashed into the checksum.
pub const CHECKSUM_PREFIX: &[u8] = b".onion checksum";

/// Address format version, appended to both the checksum preimage and the
/// encoded address.
pub const ADDRESS_VERSION: u8 = 0x03;

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Checksum bytes kept in the address.
pub const CHECKSUM_LEN: usize = 2;

/// Decoded address length: public key, checksum, version.
pub const ADDRESS_BYTES: usize = PUBLIC_KEY_LEN + CHECKSUM_LEN + 1;

/// Encoded address length in base32 characters.
pub const ADDRESS_LEN: usize = 56;

/// Cosmetic suffix used by [`to_display_address`].
pub const DISPLAY_SUFFIX: &str = ".onion";

fn checksum(public_key: &[u8; PUBLIC_KEY_LEN]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha3_256::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(public_key);
    hasher.update([ADDRESS_VERSION]);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

/// Derive the address for a public key.
pub fn derive_address(public_key: &[u8; PUBLIC_KEY_LEN]) -> String {
    let mut raw = [0u8; ADDRESS_BYTES];
    raw[..PUBLIC_KEY_LEN].copy_from_slice(public_key);
    raw[PUBLIC_KEY_LEN..PUBLIC_KEY_LEN + CHECKSUM_LEN].copy_from_slice(&checksum(public_key));
    raw[ADDRESS_BYTES - 1] = ADDRESS_VERSION;
    BASE32.encode(&raw).to_ascii_lowercase()
}

/// Append the `.onion` suffix. No validation is performed.
pub fn to_display_address(address: &str) -> String {
    format!("{address}{DISPLAY_SUFFIX}")
}

/// Decode an address and return the public key it embeds.
///
/// Accepts either letter case and an optional `.onion` suffix. The version
/// byte and checksum must match.
pub fn parse_address(address: &str) -> Result<[u8; PUBLIC_KEY_LEN], KeyError> {
    let trimmed = address.trim();
    let bare = trimmed.strip_suffix(DISPLAY_SUFFIX).unwrap_or(trimmed);

    if bare.len() != ADDRESS_LEN {
        return Err(KeyError::InvalidAddress(format!(
            "expected {ADDRESS_LEN} characters, got {}",
            bare.len()
        )));
    }

    let raw = BASE32
        .decode(bare.to_ascii_uppercase().as_bytes())
        .map_err(|e| KeyError::InvalidAddress(format!("bad base32: {e}")))?;
    if raw.len() != ADDRESS_BYTES {
        return Err(KeyError::InvalidAddress(format!(
            "expected {ADDRESS_BYTES} decoded bytes, got {}",
            raw.len()
        )));
    }

    let version = raw[ADDRESS_BYTES - 1];
    if version != ADDRESS_VERSION {
        return Err(KeyError::InvalidAddress(format!(
            "unsupported version {version:#04x}"
        )));
    }

    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(&raw[..PUBLIC_KEY_LEN]);

    if raw[PUBLIC_KEY_LEN..PUBLIC_KEY_LEN + CHECKSUM_LEN] != checksum(&public_key) {
        return Err(KeyError::InvalidAddress("checksum mismatch".to_string()));
    }

    Ok(public_key)
}

/// Check that `address` is well formed and embeds `public_key`.
pub fn verify_address(address: &str, public_key: &[u8; PUBLIC_KEY_LEN]) -> bool {
    match parse_address(address) {
        Ok(embedded) => constant_time_eq::constant_time_eq(&embedded, public_key),
        Err(_) => false,
    }
}
