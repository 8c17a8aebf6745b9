use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::errors::DomainError;

/// Short content hash of a canonical URL (16 lowercase hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookmarkId(String);

impl BookmarkId {
    pub const HEX_LEN: usize = 16;

    /// Derive the identifier from an already-canonical URL string.
    ///
    /// Pure function of its input: the same canonical URL yields the same id
    /// across runs and across sources.
    pub fn derive(canonical_url: &str) -> Self {
        let digest = Sha256::digest(canonical_url.as_bytes());
        let hex = hex::encode(digest);
        Self(hex[..Self::HEX_LEN].to_string())
    }

    /// Create from validated hex string
    pub fn from_hex(hex: String) -> Result<Self, DomainError> {
        if hex.len() != Self::HEX_LEN {
            return Err(DomainError::InvalidIdentifier {
                expected: format!("{} hex characters", Self::HEX_LEN),
                actual: format!("{} characters", hex.len()),
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidIdentifier {
                expected: "hex characters only".to_string(),
                actual: hex,
            });
        }

        Ok(Self(hex.to_lowercase()))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookmarkId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.to_string())
    }
}

impl TryFrom<String> for BookmarkId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(value)
    }
}

impl From<BookmarkId> for String {
    fn from(id: BookmarkId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_derive_is_deterministic() {
        let a = BookmarkId::derive("https://example.com/a");
        let b = BookmarkId::derive("https://example.com/a");
        assert_eq!(a, b);
        assert_eq!(a.as_hex().len(), BookmarkId::HEX_LEN);
    }

    #[test]
    fn test_derive_differs_for_different_urls() {
        let a = BookmarkId::derive("https://example.com/a");
        let b = BookmarkId::derive("https://example.com/b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_is_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(BookmarkId::derive("abc").as_hex(), "ba7816bf8f01cfea");
    }

    #[test]
    fn test_from_hex_invalid_length() {
        let err = BookmarkId::from_hex("abc".to_string()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_from_hex_invalid_chars() {
        let err = BookmarkId::from_str(&"z".repeat(16)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_from_hex_lowercases() {
        let id = BookmarkId::from_str("ABCDEF0123456789").unwrap();
        assert_eq!(id.as_hex(), "abcdef0123456789");
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let id = BookmarkId::derive("https://example.com/");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_hex()));
        let back: BookmarkId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
