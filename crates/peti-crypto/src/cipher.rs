//! AES-256-GCM message sealing.
//!
//! Sealed layout: `ciphertext || 16-byte GCM tag`, with the 96-bit nonce
//! carried alongside rather than prepended.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::kdf::{derive_key, EncryptionKey};
use crate::{CryptoError, NONCE_SIZE};

/// Output of [`encrypt`]: ciphertext (tag included) and the nonce it was
/// sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
}

/// Encrypt `message` under the key derived from `password`.
pub fn encrypt(message: &str, password: &str) -> Result<Sealed, CryptoError> {
    let key = derive_key(password)?;
    encrypt_with_key(&key, message)
}

/// Encrypt `message` with an already-derived key and a fresh random nonce.
pub fn encrypt_with_key(key: &EncryptionKey, message: &str) -> Result<Sealed, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), message.as_bytes())
        .map_err(|e| CryptoError::Provider(format!("encrypt: {e}")))?;

    Ok(Sealed { ciphertext, nonce })
}

/// Decrypt `ciphertext` sealed under `nonce` with the key derived from
/// `password`.
pub fn decrypt(ciphertext: &[u8], nonce: &[u8], password: &str) -> Result<String, CryptoError> {
    let key = derive_key(password)?;
    decrypt_with_key(&key, ciphertext, nonce)
}

/// Decrypt with an already-derived key.
///
/// A nonce of the wrong size could never have come from [`encrypt`], so it is
/// reported exactly like a failed tag check.
pub fn decrypt_with_key(
    key: &EncryptionKey,
    ciphertext: &[u8],
    nonce: &[u8],
) -> Result<String, CryptoError> {
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::AuthenticationFailure);
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailure)?;

    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Malformed("decrypted message is not valid UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{derive_key_with, KdfParams};
    use crate::TAG_SIZE;

    fn key(password: &str) -> EncryptionKey {
        derive_key_with(password, &KdfParams { rounds: 1_000 }).unwrap()
    }

    #[test]
    fn round_trip() {
        let k = key("test-password");
        let sealed = encrypt_with_key(&k, "hello, peti!").unwrap();
        assert_eq!(sealed.ciphertext.len(), "hello, peti!".len() + TAG_SIZE);
        let pt = decrypt_with_key(&k, &sealed.ciphertext, &sealed.nonce).unwrap();
        assert_eq!(pt, "hello, peti!");
    }

    #[test]
    fn round_trip_empty_and_multibyte() {
        let k = key("pw");
        for message in ["", "héllo wörld", "秘密のメッセージ", "🔥📦🔥", "line\nbreak\0nul"] {
            let sealed = encrypt_with_key(&k, message).unwrap();
            assert_eq!(
                decrypt_with_key(&k, &sealed.ciphertext, &sealed.nonce).unwrap(),
                message
            );
        }
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = encrypt_with_key(&key("key-one"), "secret").unwrap();
        assert_eq!(
            decrypt_with_key(&key("key-two"), &sealed.ciphertext, &sealed.nonce),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let k = key("pw");
        let mut sealed = encrypt_with_key(&k, "do not touch").unwrap();
        sealed.ciphertext[0] ^= 0x01;
        assert_eq!(
            decrypt_with_key(&k, &sealed.ciphertext, &sealed.nonce),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn mismatched_nonce_fails() {
        let k = key("pw");
        let sealed = encrypt_with_key(&k, "message").unwrap();
        let mut other = sealed.nonce;
        other[NONCE_SIZE - 1] ^= 0xff;
        assert_eq!(
            decrypt_with_key(&k, &sealed.ciphertext, &other),
            Err(CryptoError::AuthenticationFailure)
        );
        assert_eq!(
            decrypt_with_key(&k, &sealed.ciphertext, &sealed.nonce[..8]),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let k = key("pw");
        let sealed = encrypt_with_key(&k, "message").unwrap();
        assert_eq!(
            decrypt_with_key(&k, &sealed.ciphertext[..TAG_SIZE - 1], &sealed.nonce),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn nonces_are_fresh() {
        let k = key("pw");
        let a = encrypt_with_key(&k, "same message").unwrap();
        let b = encrypt_with_key(&k, "same message").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn full_strength_scenario() {
        let sealed = encrypt("hello world", "correct-horse").unwrap();
        assert_eq!(
            decrypt(&sealed.ciphertext, &sealed.nonce, "correct-horse").unwrap(),
            "hello world"
        );
        assert_eq!(
            decrypt(&sealed.ciphertext, &sealed.nonce, "wrong-password"),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn empty_password_rejected() {
        assert_eq!(encrypt("msg", ""), Err(CryptoError::EmptyPassword));
    }
}
