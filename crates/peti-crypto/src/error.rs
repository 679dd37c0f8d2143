use thiserror::Error;

/// Errors from the client crypto engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Passwords must be non-empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// AEAD verification failed: wrong password, tampered ciphertext, or a
    /// nonce that does not belong to the ciphertext. These causes cannot be
    /// told apart.
    #[error("decryption failed: wrong password or corrupted data")]
    AuthenticationFailure,

    /// Transport encoding or plaintext encoding is invalid.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The crypto provider refused the operation.
    #[error("crypto provider error: {0}")]
    Provider(String),
}
