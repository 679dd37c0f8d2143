//! Transport encoding for sealed messages.
//!
//! Ciphertext and nonce travel as standard, padded base64 strings. These three
//! functions ([`encrypt_message`], [`decrypt_message`] and
//! [`crate::hash_password`]) are the whole surface a front end needs.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::cipher::{decrypt, encrypt, Sealed};
use crate::CryptoError;

/// A sealed message in its wire form, as stored by the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSecret {
    /// base64(ciphertext || tag)
    pub encrypted: String,
    /// base64(nonce)
    pub iv: String,
}

impl Sealed {
    pub fn encode(&self) -> EncodedSecret {
        EncodedSecret {
            encrypted: STANDARD.encode(&self.ciphertext),
            iv: STANDARD.encode(self.nonce),
        }
    }
}

/// Encrypt `message` under `password` and encode it for transport.
pub fn encrypt_message(message: &str, password: &str) -> Result<EncodedSecret, CryptoError> {
    Ok(encrypt(message, password)?.encode())
}

/// Decode and decrypt a transport-encoded message.
pub fn decrypt_message(
    encrypted_b64: &str,
    iv_b64: &str,
    password: &str,
) -> Result<String, CryptoError> {
    let ciphertext = STANDARD
        .decode(encrypted_b64)
        .map_err(|e| CryptoError::Malformed(format!("encrypted: {e}")))?;
    let nonce = STANDARD
        .decode(iv_b64)
        .map_err(|e| CryptoError::Malformed(format!("iv: {e}")))?;
    decrypt(&ciphertext, &nonce, password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NONCE_SIZE;

    #[test]
    fn encoded_round_trip() {
        let encoded = encrypt_message("hello world", "correct-horse").unwrap();
        // 12-byte nonce → 16 base64 chars, no padding needed.
        assert_eq!(encoded.iv.len(), 16);
        assert_eq!(STANDARD.decode(&encoded.iv).unwrap().len(), NONCE_SIZE);
        assert_eq!(
            decrypt_message(&encoded.encrypted, &encoded.iv, "correct-horse").unwrap(),
            "hello world"
        );
        assert_eq!(
            decrypt_message(&encoded.encrypted, &encoded.iv, "wrong-password"),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn invalid_base64_is_malformed() {
        assert!(matches!(
            decrypt_message("not base64!!", "AAAAAAAAAAAAAAAA", "pw"),
            Err(CryptoError::Malformed(_))
        ));
        assert!(matches!(
            decrypt_message("AAAA", "%%%", "pw"),
            Err(CryptoError::Malformed(_))
        ));
    }

    #[test]
    fn wire_shape() {
        let sealed = Sealed {
            ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
            nonce: [0u8; NONCE_SIZE],
        };
        let json = serde_json::to_value(sealed.encode()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"encrypted": "3q2+7w==", "iv": "AAAAAAAAAAAAAAAA"})
        );
    }
}
