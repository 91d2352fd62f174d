use sha2::{Digest, Sha256};

/// Creates a truncated, salted hash of an identifier for safe logging.
///
/// Used for token strings and subject names: audit records and debug logs
/// must never contain the raw credential.
pub fn log_safe_id(id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(id.as_bytes());
    let hash = hasher.finalize();

    hash[..4]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_short() {
        let a = log_safe_id("alice", "salt");
        let b = log_safe_id("alice", "salt");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn hash_depends_on_salt() {
        assert_ne!(log_safe_id("alice", "salt-1"), log_safe_id("alice", "salt-2"));
    }

    #[test]
    fn hash_never_contains_the_input() {
        let token = "eyJhbGciOiJSUzI1NiJ9.secret.payload";
        assert!(!log_safe_id(token, "salt").contains("secret"));
    }
}
