//! Key pairs and addressable keys.
//!
//! A [`Key`] owns an Ed25519 key pair, the address derived from its public
//! key, a [`KeyKind`] tag and optional expiry and parent links. Keys are
//! immutable once generated; private key material is zeroized on drop.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand_core::{CryptoRngCore, OsRng};
use serde::{Deserialize, Serialize, Serializer};
use sha3::digest::generic_array::GenericArray;
use sha3::{Digest, Sha3_256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::address::{derive_address, parse_address, to_display_address, PUBLIC_KEY_LEN};
use crate::error::KeyError;
use crate::persist::KeyDocument;

/// Encoded key pair length: secret seed followed by public key.
pub const PRIVATE_KEY_LEN: usize = 64;

/// Ed25519 secret seed length.
pub const SECRET_SEED_LEN: usize = 32;

/// Shortest seed accepted by [`Key::from_seed`].
pub const MIN_SEED_LEN: usize = 32;

/// Privilege scope of a key. Advisory only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Long-lived top-level key
    #[default]
    Root,
    /// Secondary key for account recovery
    Recovery,
    /// Short-lived key, usually with an expiry
    Session,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Recovery => write!(f, "recovery"),
            Self::Session => write!(f, "session"),
        }
    }
}

impl FromStr for KeyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "root" => Ok(Self::Root),
            "recovery" => Ok(Self::Recovery),
            "session" => Ok(Self::Session),
            _ => Err(format!("Unknown key kind: {s}")),
        }
    }
}

/// An Ed25519 signing key pair.
///
/// The public key is always the one paired with the private key; it is
/// recomputed from the secret rather than stored separately.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a key pair from the given random source.
    pub fn generate_with_rng<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    /// Build a key pair by hashing arbitrary seed material into an Ed25519
    /// secret seed. Same material, same key pair.
    fn from_seed_material(material: &[u8]) -> Self {
        let mut secret = Zeroizing::new([0u8; SECRET_SEED_LEN]);
        let mut hasher = Sha3_256::new();
        hasher.update(material);
        hasher.finalize_into(GenericArray::from_mut_slice(&mut secret[..]));
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// Rebuild a key pair from its 64-byte encoding.
    ///
    /// Fails if the trailing public key does not belong to the leading secret.
    pub fn from_keypair_bytes(bytes: &[u8; PRIVATE_KEY_LEN]) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|_| KeyError::Encoding("public key is not paired with private key".to_string()))?;
        Ok(Self { signing_key })
    }

    /// Public key bytes.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Private key bytes (`secret_seed || public_key`), wiped when dropped.
    pub fn private_key(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// Sign a message. Returns a 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_bytes()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq::constant_time_eq(&self.private_key()[..], &other.private_key()[..])
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key()))
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Verify an Ed25519 signature against a public key.
pub fn verify_signature(
    public_key: &[u8; PUBLIC_KEY_LEN],
    message: &[u8],
    signature: &[u8; 64],
) -> Result<(), KeyError> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|_| KeyError::InvalidSignature)?;
    let sig = Signature::from_bytes(signature);
    verifying_key
        .verify_strict(message, &sig)
        .map_err(|_| KeyError::InvalidSignature)
}

/// A named, addressable key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "KeyFile")]
pub struct Key {
    address: String,
    key_pair: KeyPair,
    expires: Option<DateTime<Utc>>,
    kind: KeyKind,
    parent_address: Option<String>,
}

impl Key {
    fn assemble(
        key_pair: KeyPair,
        kind: KeyKind,
        expires: Option<DateTime<Utc>>,
        parent_address: Option<String>,
    ) -> Self {
        let address = derive_address(&key_pair.public_key());
        tracing::debug!(%address, %kind, "generated key");
        Self {
            address,
            key_pair,
            expires,
            kind,
            parent_address,
        }
    }

    /// Generate a random root key.
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut OsRng, KeyKind::Root)
    }

    /// Generate a random recovery key.
    pub fn generate_recovery() -> Self {
        Self::generate_with_rng(&mut OsRng, KeyKind::Recovery)
    }

    /// Generate a random session key that expires at `expires_at`.
    ///
    /// Expiry is metadata for callers to check; it does not restrict what
    /// the key can sign.
    pub fn generate_session(expires_at: DateTime<Utc>) -> Self {
        let key_pair = KeyPair::generate_with_rng(&mut OsRng);
        Self::assemble(key_pair, KeyKind::Session, Some(expires_at), None)
    }

    /// Generate a key of the given kind from a caller-supplied random source.
    pub fn generate_with_rng<R: CryptoRngCore + ?Sized>(rng: &mut R, kind: KeyKind) -> Self {
        Self::assemble(KeyPair::generate_with_rng(rng), kind, None, None)
    }

    /// Deterministically derive a root key from a seed.
    ///
    /// The Ed25519 secret is `SHA3-256(seed)`, not the seed itself. A 32-byte
    /// seed therefore does not give the key that RFC 8032 seeded generation
    /// (or Go's `ed25519.NewKeyFromSeed`) produces from the same bytes, and
    /// seeds cannot be shared with those tools. Seeds shorter than
    /// [`MIN_SEED_LEN`] are rejected.
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        if seed.len() < MIN_SEED_LEN {
            return Err(KeyError::InvalidSeedLength {
                min: MIN_SEED_LEN,
                got: seed.len(),
            });
        }
        Ok(Self::assemble(
            KeyPair::from_seed_material(seed),
            KeyKind::Root,
            None,
            None,
        ))
    }

    /// Derive a recovery key seeded by this key's private bytes.
    ///
    /// The child records this key's address as its parent. There is no
    /// cryptographic binding between the two: a verifier must learn the
    /// relationship out of band.
    pub fn derive_child(&self) -> Self {
        let seed = self.key_pair.private_key();
        Self::assemble(
            KeyPair::from_seed_material(&seed[..]),
            KeyKind::Recovery,
            None,
            Some(self.address.clone()),
        )
    }

    /// The key's address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The address with the `.onion` suffix.
    pub fn display_address(&self) -> String {
        to_display_address(&self.address)
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.key_pair.public_key()
    }

    pub fn private_key(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        self.key_pair.private_key()
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Address of the key this one was derived from, if any.
    pub fn parent_address(&self) -> Option<&str> {
        self.parent_address.as_deref()
    }

    /// True if the key has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Sign a message with this key.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.key_pair.sign(message)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        KeyFile::from(self).serialize(serializer)
    }
}

impl KeyDocument for Key {
    fn from_json(json: &str) -> Result<Self, KeyError> {
        let file: KeyFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }
}

/// On-disk key layout. Byte fields are standard base64.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeyFile {
    #[serde(alias = "Address")]
    address: String,
    #[serde(alias = "PublicKey")]
    public_key: String,
    #[serde(alias = "PrivateKey")]
    private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<String>,
    #[serde(default)]
    #[zeroize(skip)]
    kind: KeyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_address: Option<String>,
}

impl From<&Key> for KeyFile {
    fn from(key: &Key) -> Self {
        Self {
            address: key.address.clone(),
            public_key: STANDARD.encode(key.public_key()),
            private_key: STANDARD.encode(&key.private_key()[..]),
            expires: key
                .expires
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            kind: key.kind,
            parent_address: key.parent_address.clone(),
        }
    }
}

impl TryFrom<KeyFile> for Key {
    type Error = KeyError;

    fn try_from(file: KeyFile) -> Result<Self, Self::Error> {
        let public_key = STANDARD
            .decode(&file.public_key)
            .map_err(|e| KeyError::Encoding(format!("invalid public_key base64: {e}")))?;
        if public_key.len() != PUBLIC_KEY_LEN {
            return Err(KeyError::InvalidKeyLength {
                expected: PUBLIC_KEY_LEN,
                got: public_key.len(),
            });
        }

        let private_key = Zeroizing::new(
            STANDARD
                .decode(&file.private_key)
                .map_err(|e| KeyError::Encoding(format!("invalid private_key base64: {e}")))?,
        );
        let private_key: &[u8; PRIVATE_KEY_LEN] =
            private_key
                .as_slice()
                .try_into()
                .map_err(|_| KeyError::InvalidKeyLength {
                    expected: PRIVATE_KEY_LEN,
                    got: private_key.len(),
                })?;

        let key_pair = KeyPair::from_keypair_bytes(private_key)?;
        if key_pair.public_key()[..] != public_key[..] {
            return Err(KeyError::Encoding(
                "public_key does not match private_key".to_string(),
            ));
        }

        let derived = derive_address(&key_pair.public_key());
        if derived != file.address {
            return Err(KeyError::AddressMismatch {
                stored: file.address.clone(),
                derived,
            });
        }

        let expires = file
            .expires
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| KeyError::Encoding(format!("invalid expires timestamp: {e}")))
            })
            .transpose()?;

        if let Some(parent) = file.parent_address.as_deref() {
            parse_address(parent)?;
        }

        Ok(Self {
            address: derived,
            key_pair,
            expires,
            kind: file.kind,
            parent_address: file.parent_address.clone(),
        })
    }
}
