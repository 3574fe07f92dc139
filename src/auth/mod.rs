use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Role suffix mixed into every issued token
const TOKEN_ROLE: &str = "admin";

/// The administrator password shared by both handlers.
///
/// Loaded once at startup and handed to each router explicitly. `Debug`
/// never prints the value.
#[derive(Clone)]
pub struct SharedSecret(Arc<str>);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::from(secret.into()))
    }

    /// Exact string equality, no normalization
    pub fn matches(&self, candidate: &str) -> bool {
        &*self.0 == candidate
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

/// Mint a token for a verified password at the current wall-clock second
pub fn issue_token(password: &str) -> String {
    token_at(password, Utc::now().timestamp())
}

/// `hex(sha256(password || unix_seconds || "admin"))`
pub fn token_at(password: &str, unix_seconds: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(unix_seconds.to_string().as_bytes());
    hasher.update(TOKEN_ROLE.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_requires_exact_match() {
        let secret = SharedSecret::new("6745Q-");
        assert!(secret.matches("6745Q-"));
        assert!(!secret.matches("6745q-"));
        assert!(!secret.matches(" 6745Q-"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn debug_hides_secret() {
        let secret = SharedSecret::new("hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }

    #[test]
    fn token_is_sha256_hex() {
        let token = token_at("pw", 1_700_000_000);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let mut hasher = Sha256::new();
        hasher.update(b"pw1700000000admin");
        assert_eq!(token, format!("{:x}", hasher.finalize()));
    }

    #[test]
    fn token_is_salted_by_time() {
        assert_eq!(token_at("pw", 10), token_at("pw", 10));
        assert_ne!(token_at("pw", 10), token_at("pw", 11));
    }
}
