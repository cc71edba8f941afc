//! Key ring: a root key plus keys indexed by address.
//!
//! The hierarchy is flat. A derived key points at its parent through
//! `parent_address`; the ring's map is the only place keys live. A ring is
//! an in-memory index with no locking and no expiry sweeping.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::KeyError;
use crate::key::Key;
use crate::persist::KeyDocument;

/// A root key and a set of keys addressable by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RingFile")]
pub struct Ring {
    #[serde(skip_serializing_if = "Option::is_none")]
    root_key: Option<Key>,
    keys: BTreeMap<String, Key>,
}

impl Ring {
    /// Create an empty ring with no root key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root key. The root is not added to the address map.
    pub fn set_root(&mut self, key: Key) {
        tracing::debug!(address = %key.address(), "set ring root");
        self.root_key = Some(key);
    }

    pub fn root_key(&self) -> Option<&Key> {
        self.root_key.as_ref()
    }

    /// Insert a key under its own address.
    ///
    /// An existing key with the same address is replaced without error and
    /// returned.
    pub fn insert(&mut self, key: Key) -> Option<Key> {
        let address = key.address().to_string();
        let previous = self.keys.insert(address.clone(), key);
        if previous.is_some() {
            tracing::debug!(%address, "replaced key in ring");
        } else {
            tracing::debug!(%address, "inserted key into ring");
        }
        previous
    }

    /// Look up a key by address.
    pub fn lookup(&self, address: &str) -> Option<&Key> {
        self.keys.get(address)
    }

    /// Remove a key by address. Returns whether one was present.
    pub fn remove(&mut self, address: &str) -> bool {
        let removed = self.keys.remove(address).is_some();
        if removed {
            tracing::debug!(%address, "removed key from ring");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Addresses in the ring, in sorted order.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.values()
    }

    /// Keys whose parent is `parent_address`.
    pub fn children_of<'a>(&'a self, parent_address: &'a str) -> impl Iterator<Item = &'a Key> {
        self.keys
            .values()
            .filter(move |key| key.parent_address() == Some(parent_address))
    }

    /// Keys that have expired as of `now`. Nothing is removed.
    pub fn expired_at(&self, now: DateTime<Utc>) -> Vec<&Key> {
        self.keys
            .values()
            .filter(|key| key.is_expired_at(now))
            .collect()
    }
}

impl KeyDocument for Ring {
    fn from_json(json: &str) -> Result<Self, KeyError> {
        let file: RingFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }
}

#[derive(Deserialize)]
struct RingFile {
    #[serde(default)]
    root_key: Option<Key>,
    #[serde(default)]
    keys: BTreeMap<String, Key>,
}

impl TryFrom<RingFile> for Ring {
    type Error = KeyError;

    fn try_from(file: RingFile) -> Result<Self, Self::Error> {
        for (address, key) in &file.keys {
            if address != key.address() {
                return Err(KeyError::AddressMismatch {
                    stored: address.clone(),
                    derived: key.address().to_string(),
                });
            }
        }
        Ok(Self {
            root_key: file.root_key,
            keys: file.keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;
    use chrono::Duration;

    #[test]
    fn test_new_ring_is_empty() {
        let ring = Ring::new();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert!(ring.root_key().is_none());
    }

    #[test]
    fn test_insert_then_lookup() {
        let mut ring = Ring::new();
        let key = Key::generate();
        let address = key.address().to_string();

        assert!(ring.insert(key.clone()).is_none());
        assert_eq!(ring.lookup(&address), Some(&key));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_remove_then_lookup() {
        let mut ring = Ring::new();
        let key = Key::generate();
        let address = key.address().to_string();
        ring.insert(key);

        assert!(ring.remove(&address));
        assert!(ring.lookup(&address).is_none());
        assert!(!ring.remove(&address));
    }

    #[test]
    fn test_insert_same_address_overwrites() {
        let mut ring = Ring::new();
        let key = Key::from_seed(&[7u8; 32]).unwrap();
        ring.insert(key.clone());

        let previous = ring.insert(key.clone());
        assert_eq!(previous, Some(key));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_set_root_does_not_insert() {
        let mut ring = Ring::new();
        let root = Key::generate();
        let address = root.address().to_string();
        ring.set_root(root);

        assert_eq!(ring.root_key().map(Key::address), Some(address.as_str()));
        assert!(ring.lookup(&address).is_none());
        assert!(ring.is_empty());
    }

    #[test]
    fn test_children_of() {
        let mut ring = Ring::new();
        let root = Key::generate();
        let child = root.derive_child();
        let unrelated = Key::generate_recovery();
        ring.insert(child.clone());
        ring.insert(unrelated);
        ring.set_root(root.clone());

        let children: Vec<_> = ring.children_of(root.address()).collect();
        assert_eq!(children, vec![&child]);
    }

    #[test]
    fn test_expired_at() {
        let mut ring = Ring::new();
        let now = Utc::now();
        let stale = Key::generate_session(now - Duration::minutes(5));
        let fresh = Key::generate_session(now + Duration::minutes(5));
        ring.insert(stale.clone());
        ring.insert(fresh);
        ring.insert(Key::generate());

        let expired = ring.expired_at(now);
        assert_eq!(expired, vec![&stale]);
        assert_eq!(expired[0].kind(), KeyKind::Session);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_addresses_sorted() {
        let mut ring = Ring::new();
        for _ in 0..5 {
            ring.insert(Key::generate());
        }
        let addresses: Vec<_> = ring.addresses().collect();
        let mut sorted = addresses.clone();
        sorted.sort_unstable();
        assert_eq!(addresses, sorted);
    }
}
