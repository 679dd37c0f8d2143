//! Store lookup key: base64(SHA-256(password)).
//!
//! Deterministic and one-way. It indexes the vault and plays no part in
//! encryption.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// The vault index derived from a password.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the lookup key for `password`.
pub fn hash_password(password: &str) -> Result<LookupKey, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }
    let digest = Sha256::digest(password.as_bytes());
    Ok(LookupKey(STANDARD.encode(digest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            hash_password("abc").unwrap().as_str(),
            "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
        );
    }

    #[test]
    fn deterministic_and_distinct() {
        let a1 = hash_password("correct-horse").unwrap();
        let a2 = hash_password("correct-horse").unwrap();
        let b = hash_password("correct-horsf").unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_eq!(a1.as_str().len(), 44);
    }

    #[test]
    fn does_not_contain_password() {
        let key = hash_password("hunter2").unwrap();
        assert!(!key.as_str().contains("hunter2"));
    }

    #[test]
    fn empty_password_rejected() {
        assert_eq!(hash_password(""), Err(CryptoError::EmptyPassword));
    }
}
