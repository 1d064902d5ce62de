use std::fmt::Display;

use sha2::{Digest, Sha256};

// not impl Copy intentionally, addresses are passed by reference
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Deref)]
pub struct Address([u8; 32]);

/// Kind prefix of a logical key. Tags never contain `/`, so the tag in front
/// of the first `/` tells the kinds apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Variable,
    Array,
    Slice,
    SliceArray,
    Map,
    IterableMap,
    IterableMapKeys,
    IterableMapKeysArray,
}

impl Namespace {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Array => "array",
            Self::Slice => "slice",
            Self::SliceArray => "slice_array",
            Self::Map => "map",
            Self::IterableMap => "iterable_map",
            Self::IterableMapKeys => "iterable_map_keys",
            Self::IterableMapKeysArray => "iterable_map_keys_array",
        }
    }

    /// Namespace holding the backing arrays of a slice namespace.
    pub fn backing(&self) -> Self {
        match self {
            Self::IterableMapKeys => Self::IterableMapKeysArray,
            _ => Self::SliceArray,
        }
    }
}

impl Address {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn logical_key(namespace: Namespace, segments: &[&str]) -> String {
        let mut key = namespace.tag().to_string();
        for segment in segments {
            key.push('/');
            key.push_str(segment)
        }
        key
    }

    /// `sha256(tag "/" segment ("/" segment)*)`
    pub fn derive(namespace: Namespace, segments: &[&str]) -> Self {
        let key = Self::logical_key(namespace, segments);
        Self::from_digest(&Sha256::digest(key.as_bytes()))
    }

    /// Sub-address `sha256(self || suffix)`, used for the words of one slot.
    pub fn suffixed(&self, suffix: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(suffix.as_bytes());
        Self::from_digest(&hasher.finalize())
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0; 32];
        bytes.copy_from_slice(digest);
        Self(bytes)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn logical_keys_are_tagged() {
        assert_eq!(
            Address::logical_key(Namespace::Array, &["numbers", "length"]),
            "array/numbers/length"
        );
        assert_eq!(
            Address::logical_key(Namespace::Variable, &["owner"]),
            "variable/owner"
        );
    }

    #[test]
    fn kinds_do_not_share_addresses() {
        // joining prefixes with `_` would turn both into "array_length_x_0"
        let element = Address::derive(Namespace::Array, &["length_x", "0"]);
        let length = Address::derive(Namespace::Array, &["x_0", "length"]);
        assert_ne!(element, length);
        assert_ne!(
            Address::derive(Namespace::Variable, &["a"]),
            Address::derive(Namespace::Map, &["a"])
        );
        assert_ne!(
            Address::derive(Namespace::Slice, &["s", "length"]),
            Address::derive(Namespace::SliceArray, &["s", "length"])
        );
    }

    #[test]
    fn display_is_prefixed_hex() {
        let address = Address::from_bytes([0xab; 32]);
        let rendered = address.to_string();
        assert!(rendered.starts_with("0xabab"));
        assert_eq!(rendered.len(), 2 + 64);
    }

    #[test]
    fn suffixes_separate_slot_words() {
        let base = Address::derive(Namespace::Variable, &["v"]);
        assert_ne!(base.suffixed("length"), base.suffixed("0_index"));
        assert_ne!(base.suffixed("0_index"), base.suffixed("1_index"));
    }

    proptest! {
        #[test]
        fn derivation_is_pure(name in ".*", index in 0usize..1000) {
            let index = index.to_string();
            let first = Address::derive(Namespace::Array, &[&name, &index]);
            let second = Address::derive(Namespace::Array, &[&name, &index]);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn distinct_names_get_distinct_addresses(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            prop_assume!(a != b);
            prop_assert_ne!(
                Address::derive(Namespace::Variable, &[&a]),
                Address::derive(Namespace::Variable, &[&b])
            );
        }
    }
}
