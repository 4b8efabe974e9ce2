use pns_types::ContainerAddress;

/// Domain-separated BLAKE3 hasher mapping names to container addresses.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a public name and, say, a profile nick with identical
/// bytes land on different addresses.
pub struct NameHasher {
    domain: &'static str,
}

impl NameHasher {
    /// Hasher for public names (locates the services container of a name).
    pub const PUBLIC_NAME: Self = Self {
        domain: "pns-public-name-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash a name. Surrounding whitespace is trimmed first, so `" alice "`
    /// and `"alice"` map to the same address.
    pub fn hash(&self, name: &str) -> ContainerAddress {
        self.hash_bytes(name.trim().as_bytes())
    }

    /// Hash raw bytes with domain separation.
    pub fn hash_bytes(&self, data: &[u8]) -> ContainerAddress {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContainerAddress::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that `name` hashes to `expected`.
    pub fn verify(&self, name: &str, expected: &ContainerAddress) -> bool {
        self.hash(name) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_is_deterministic() {
        let a = NameHasher::PUBLIC_NAME.hash("happybeing");
        let b = NameHasher::PUBLIC_NAME.hash("happybeing");
        assert_eq!(a, b);
        assert!(!a.is_null());
    }

    #[test]
    fn hash_ignores_surrounding_whitespace() {
        assert_eq!(
            NameHasher::PUBLIC_NAME.hash("  happybeing\t"),
            NameHasher::PUBLIC_NAME.hash("happybeing")
        );
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let custom = NameHasher::new("pns-test-v1");
        assert_ne!(custom.hash("alice"), NameHasher::PUBLIC_NAME.hash("alice"));
    }

    #[test]
    fn verify_matches_hash() {
        let addr = NameHasher::PUBLIC_NAME.hash("alice");
        assert!(NameHasher::PUBLIC_NAME.verify("alice", &addr));
        assert!(!NameHasher::PUBLIC_NAME.verify("bob", &addr));
    }

    proptest! {
        #[test]
        fn stable_for_same_trimmed_name(name in "[a-z0-9-]{1,32}") {
            let padded = format!(" {name} ");
            prop_assert_eq!(
                NameHasher::PUBLIC_NAME.hash(&padded),
                NameHasher::PUBLIC_NAME.hash(&name)
            );
        }

        #[test]
        fn distinct_names_distinct_addresses(a in "[a-z]{1,16}", b in "[a-z]{1,16}") {
            prop_assume!(a != b);
            prop_assert_ne!(NameHasher::PUBLIC_NAME.hash(&a), NameHasher::PUBLIC_NAME.hash(&b));
        }
    }
}
