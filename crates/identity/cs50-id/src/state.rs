//! Anti-forgery `state` values for CSRF protection.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Per-attempt value binding the provider callback to the session that
/// started the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiForgeryToken(String);

impl AntiForgeryToken {
    /// Generate a fresh token, unrelated to any previous one
    pub fn generate() -> Self {
        let nonce = Uuid::new_v4();
        let digest = Sha256::digest(nonce.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Compare a stored token against the returned `state` in constant time.
    pub fn matches(stored: &str, returned: &str) -> bool {
        stored.len() == returned.len() && bool::from(stored.as_bytes().ct_eq(returned.as_bytes()))
    }
}

impl std::fmt::Display for AntiForgeryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let tokens: HashSet<String> = (0..100)
            .map(|_| AntiForgeryToken::generate().into_inner())
            .collect();
        assert_eq!(tokens.len(), 100);

        for token in &tokens {
            // 32 byte digest, base64url without padding
            assert_eq!(token.len(), 43);
            assert!(
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn test_matches_is_exact() {
        let token = AntiForgeryToken::generate();
        assert!(AntiForgeryToken::matches(token.as_str(), token.as_str()));
        assert!(!AntiForgeryToken::matches(token.as_str(), &token.as_str()[1..]));
        assert!(!AntiForgeryToken::matches(
            token.as_str(),
            &token.as_str().to_uppercase()
        ));
        assert!(!AntiForgeryToken::matches(token.as_str(), ""));
    }
}
