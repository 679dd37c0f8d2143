//! Key stretching: password → 256-bit AES key via PBKDF2-HMAC-SHA256.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::{CryptoError, KDF_SALT, KEY_SIZE, PBKDF2_ROUNDS};

/// 32-byte AES-256 key derived from a password. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncryptionKey").field(&"[REDACTED]").finish()
    }
}

/// PBKDF2 parameters.
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Iteration count (default: 100 000)
    pub rounds: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            rounds: PBKDF2_ROUNDS,
        }
    }
}

/// Derive the encryption key for `password` with the production work factor.
pub fn derive_key(password: &str) -> Result<EncryptionKey, CryptoError> {
    derive_key_with(password, &KdfParams::default())
}

/// Derive the encryption key for `password` with explicit parameters.
///
/// The salt is always [`KDF_SALT`], so the output depends only on the password
/// and the round count.
pub fn derive_key_with(password: &str, params: &KdfParams) -> Result<EncryptionKey, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }
    if params.rounds == 0 {
        return Err(CryptoError::Provider("pbkdf2 rounds must be non-zero".into()));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), KDF_SALT, params.rounds, &mut key);
    Ok(EncryptionKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams { rounds: 1_000 }
    }

    #[test]
    fn deterministic() {
        let a = derive_key_with("correct-horse", &fast()).unwrap();
        let b = derive_key_with("correct-horse", &fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn different_passwords_differ() {
        let a = derive_key_with("password-a", &fast()).unwrap();
        let b = derive_key_with("password-b", &fast()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn rounds_change_the_key() {
        let a = derive_key_with("same", &KdfParams { rounds: 1_000 }).unwrap();
        let b = derive_key_with("same", &KdfParams { rounds: 1_001 }).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn production_params_match_default_derivation() {
        let a = derive_key("correct-horse").unwrap();
        let b = derive_key_with("correct-horse", &KdfParams { rounds: 100_000 }).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn empty_password_rejected() {
        assert_eq!(
            derive_key_with("", &fast()).unwrap_err(),
            CryptoError::EmptyPassword
        );
    }

    #[test]
    fn zero_rounds_rejected() {
        assert!(matches!(
            derive_key_with("pw", &KdfParams { rounds: 0 }),
            Err(CryptoError::Provider(_))
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let key = derive_key_with("pw", &fast()).unwrap();
        assert_eq!(format!("{key:?}"), "EncryptionKey(\"[REDACTED]\")");
    }
}
