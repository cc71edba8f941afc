#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::address::{derive_address, parse_address, verify_address, ADDRESS_LEN};
    use crate::key::{verify_signature, Key};
    use crate::persist::KeyDocument;
    use crate::ring::Ring;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Same seed, same key pair and address
        #[test]
        fn test_seeded_generation_determinism(seed in prop::collection::vec(any::<u8>(), 32..128)) {
            let a = Key::from_seed(&seed).unwrap();
            let b = Key::from_seed(&seed).unwrap();
            prop_assert_eq!(a.address(), b.address());
            prop_assert_eq!(a.public_key(), b.public_key());
            let (a_private, b_private) = (a.private_key(), b.private_key());
            prop_assert_eq!(&a_private[..], &b_private[..]);
        }

        // Address shape holds for any 32 bytes
        #[test]
        fn test_address_shape(public_key in any::<[u8; 32]>()) {
            let address = derive_address(&public_key);
            prop_assert_eq!(address.len(), ADDRESS_LEN);
            prop_assert_eq!(address.clone(), address.to_ascii_lowercase());
            prop_assert!(address.chars().all(|c| c.is_ascii_lowercase() || ('2'..='7').contains(&c)));
        }

        // Addresses decode back to the key that produced them
        #[test]
        fn test_address_parse_round_trip(public_key in any::<[u8; 32]>()) {
            let address = derive_address(&public_key);
            prop_assert_eq!(parse_address(&address).unwrap(), public_key);
            prop_assert!(verify_address(&address, &public_key));
        }

        // Distinct public keys give distinct addresses
        #[test]
        fn test_address_injective(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            prop_assume!(a != b);
            prop_assert_ne!(derive_address(&a), derive_address(&b));
        }

        #[test]
        fn test_display_address_suffix(seed in prop::collection::vec(any::<u8>(), 32..64)) {
            let key = Key::from_seed(&seed).unwrap();
            prop_assert_eq!(key.display_address(), format!("{}.onion", key.address()));
        }

        #[test]
        fn test_signature_round_trip(seed in any::<[u8; 32]>(), message in any::<Vec<u8>>()) {
            let key = Key::from_seed(&seed).unwrap();
            let signature = key.sign(&message);
            prop_assert!(verify_signature(&key.public_key(), &message, &signature).is_ok());
        }

        // Every key decoded from a ring file sits under its own address
        #[test]
        fn test_ring_json_round_trip(count in 0usize..6, with_root in any::<bool>()) {
            let mut ring = Ring::new();
            for _ in 0..count {
                ring.insert(Key::generate());
            }
            if with_root {
                ring.set_root(Key::generate());
            }

            let json = ring.to_json("  ").unwrap();
            let decoded = Ring::from_json(&json).unwrap();
            for address in decoded.addresses() {
                prop_assert_eq!(decoded.lookup(address).map(Key::address), Some(address));
            }
            prop_assert_eq!(decoded, ring);
        }
    }
}
