use proptest::prelude::*;

use splitline_types::{DataHash, PublicKey, RequestId, Salt, Timestamp, TokenId};

proptest! {
    /// TokenId roundtrip: new -> hex -> from_hex produces identical id.
    #[test]
    fn token_id_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = TokenId::new(bytes);
        let parsed = TokenId::from_hex(&id.to_hex()).unwrap();
        prop_assert_eq!(parsed.as_bytes(), &bytes);
    }

    /// Salt display is always 64 lowercase hex characters.
    #[test]
    fn salt_display_is_64_hex(bytes in prop::array::uniform32(0u8..)) {
        let s = Salt::new(bytes).to_string();
        prop_assert_eq!(s.len(), 64);
        prop_assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// RequestId::is_zero is true only for all-zero bytes.
    #[test]
    fn request_id_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let id = RequestId::new(bytes);
        prop_assert_eq!(id.is_zero(), bytes == [0u8; 32]);
    }

    /// DataHash JSON roundtrip.
    #[test]
    fn data_hash_json_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = DataHash::new(bytes);
        let encoded = serde_json::to_string(&hash).unwrap();
        let decoded: DataHash = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// PublicKey hex parsing rejects every length other than 32 bytes.
    #[test]
    fn public_key_rejects_wrong_length(len in 0usize..64) {
        prop_assume!(len != 32);
        let hex_str = "ab".repeat(len);
        prop_assert!(PublicKey::from_hex(&hex_str).is_err());
    }

    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(base in 1u64..1_000_000, deficit in 1u64..1_000_000) {
        let later = Timestamp::from_millis(base + deficit);
        let earlier = Timestamp::from_millis(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
        prop_assert_eq!(earlier.elapsed_since(later), deficit);
    }
}
