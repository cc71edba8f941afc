//! On-disk key and ring file behavior.

use std::fs;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, TimeZone, Utc};
use scramble_keys::{Key, KeyDocument, KeyError, KeyKind, Ring};
use tempfile::TempDir;

#[test]
fn key_json_round_trip_without_expiry() {
    let key = Key::generate();
    let json = key.to_json("  ").unwrap();

    assert!(!json.contains("\"expires\""));
    assert!(!json.contains("\"parent_address\""));
    assert_eq!(Key::from_json(&json).unwrap(), key);
}

#[test]
fn key_json_round_trip_with_expiry() {
    let expires = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
    let key = Key::generate_session(expires);
    let json = key.to_json("  ").unwrap();

    assert!(json.contains("\"expires\": \"2030-01-02T03:04:05Z\""));
    let decoded = Key::from_json(&json).unwrap();
    assert_eq!(decoded, key);
    assert_eq!(decoded.kind(), KeyKind::Session);
}

#[test]
fn key_json_round_trip_with_sub_second_expiry() {
    let expires = Utc::now() + Duration::milliseconds(1500);
    let key = Key::generate_session(expires);
    let decoded = Key::from_json(&key.to_json("\t").unwrap()).unwrap();
    assert_eq!(decoded.expires(), Some(expires));
}

#[test]
fn key_json_field_order_and_indent() {
    let key = Key::from_seed(&[0u8; 32]).unwrap();
    let json = key.to_json("    ").unwrap();

    let address_at = json.find("\"address\"").unwrap();
    let public_at = json.find("\"public_key\"").unwrap();
    let private_at = json.find("\"private_key\"").unwrap();
    let kind_at = json.find("\"kind\"").unwrap();
    assert!(address_at < public_at && public_at < private_at && private_at < kind_at);
    assert!(json.contains("\n    \"address\": \"wd4z4u5ffkd3youyqz4fvlhkk3kfml3on7d3owblbiii5ii37zzrjgyd\""));
}

#[test]
fn key_json_encodes_bytes_as_base64() {
    let key = Key::generate();
    let value: serde_json::Value = serde_json::from_str(&key.to_json("  ").unwrap()).unwrap();

    let public = STANDARD.decode(value["public_key"].as_str().unwrap()).unwrap();
    let private = STANDARD.decode(value["private_key"].as_str().unwrap()).unwrap();
    assert_eq!(public, key.public_key());
    assert_eq!(private.len(), 64);
    assert_eq!(value["kind"], "root");
}

#[test]
fn legacy_field_names_are_accepted() {
    let key = Key::generate();
    let legacy = format!(
        "{{\n  \"Address\": \"{}\",\n  \"PublicKey\": \"{}\",\n  \"PrivateKey\": \"{}\"\n}}",
        key.address(),
        STANDARD.encode(key.public_key()),
        STANDARD.encode(&key.private_key()[..]),
    );

    let decoded = Key::from_json(&legacy).unwrap();
    assert_eq!(decoded, key);
    assert_eq!(decoded.kind(), KeyKind::Root);
}

#[test]
fn tampered_address_is_rejected() {
    let key = Key::generate();
    let other = Key::generate();
    let json = key
        .to_json("  ")
        .unwrap()
        .replace(key.address(), other.address());

    assert!(matches!(
        Key::from_json(&json),
        Err(KeyError::AddressMismatch { .. })
    ));
}

#[test]
fn mismatched_public_key_is_rejected() {
    let key = Key::generate();
    let other = Key::generate();
    let json = key.to_json("  ").unwrap().replace(
        &STANDARD.encode(key.public_key()),
        &STANDARD.encode(other.public_key()),
    );

    // base64 of the standalone field does not occur inside private_key
    assert!(Key::from_json(&json).is_err());
}

#[test]
fn truncated_private_key_is_rejected() {
    let key = Key::generate();
    let value = serde_json::json!({
        "address": key.address(),
        "public_key": STANDARD.encode(key.public_key()),
        "private_key": STANDARD.encode(&key.private_key()[..32]),
    });

    let err = Key::from_json(&value.to_string()).unwrap_err();
    assert!(err.to_string().contains("invalid key length"));
}

#[test]
fn write_file_refuses_existing_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(".scramble-suit.key");

    let first = Key::generate();
    first.write_file(&path, "  ").unwrap();
    let before = fs::read(&path).unwrap();

    let second = Key::generate();
    let err = second.write_file(&path, "  ").unwrap_err();
    assert!(matches!(err, KeyError::AlreadyExists { .. }));
    assert_eq!(fs::read(&path).unwrap(), before);

    // in-memory key is still usable after the refused write
    let retry = temp_dir.path().join("retry.key");
    second.write_file(&retry, "  ").unwrap();
    assert_eq!(Key::read_file(&retry).unwrap(), second);
}

#[test]
fn key_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("root.key");

    let key = Key::from_seed(b"an example seed that is long enough").unwrap();
    key.write_file(&path, "  ").unwrap();

    let loaded = Key::read_file(&path).unwrap();
    assert_eq!(loaded, key);
}

#[test]
fn ring_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ring.json");

    let root = Key::generate();
    let mut ring = Ring::new();
    ring.insert(root.derive_child());
    ring.insert(Key::generate_session(Utc::now() + Duration::hours(2)));
    ring.set_root(root);

    ring.write_file(&path, "  ").unwrap();
    let loaded = Ring::read_file(&path).unwrap();
    assert_eq!(loaded, ring);

    // updates go through overwrite
    let mut updated = loaded;
    updated.insert(Key::generate_recovery());
    updated.overwrite_file(&path, "  ").unwrap();
    assert_eq!(Ring::read_file(&path).unwrap().len(), 3);
}

#[test]
fn empty_ring_omits_root() {
    let json = Ring::new().to_json("  ").unwrap();
    assert!(!json.contains("root_key"));
    assert!(json.contains("\"keys\": {}"));
}

#[test]
fn ring_with_aliased_entry_is_rejected() {
    let key = Key::generate();
    let other = Key::generate();
    let mut ring = Ring::new();
    ring.insert(key.clone());

    // file a key under someone else's address
    let json = ring
        .to_json("  ")
        .unwrap()
        .replacen(&format!("\"{}\": {{", key.address()), &format!("\"{}\": {{", other.address()), 1);

    assert!(matches!(
        Ring::from_json(&json),
        Err(KeyError::AddressMismatch { .. })
    ));
}

#[test]
fn reading_missing_file_reports_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let err = Key::read_file(&temp_dir.path().join("nope.key")).unwrap_err();
    assert!(matches!(err, KeyError::NotFound { .. }));
}
