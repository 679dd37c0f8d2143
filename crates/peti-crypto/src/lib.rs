//! peti-crypto: the client half of the peti vault.
//!
//! Everything here runs on the sender's or recipient's machine. The server
//! only ever sees the output of [`hash_password`] and the opaque
//! [`EncodedSecret`] produced by [`encrypt_message`].
//!
//! ```text
//! password ──PBKDF2-HMAC-SHA256 (100k rounds, fixed salt)──▶ AES-256-GCM key
//!     └─────SHA-256 ─▶ base64 ─────────────────────────────▶ lookup key
//! ```
//!
//! The two derivations are independent: the lookup key is a fast hash used only
//! as a store index, the encryption key is stretched. Someone holding a lookup
//! key can therefore test password guesses much faster than someone holding
//! only ciphertext.

pub mod cipher;
pub mod encoding;
pub mod error;
pub mod kdf;
pub mod lookup;

pub use cipher::{decrypt, decrypt_with_key, encrypt, encrypt_with_key, Sealed};
pub use encoding::{decrypt_message, encrypt_message, EncodedSecret};
pub use error::CryptoError;
pub use kdf::{derive_key, derive_key_with, EncryptionKey, KdfParams};
pub use lookup::{hash_password, LookupKey};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit).
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// PBKDF2 work factor.
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Fixed, public KDF salt. It forces per-derivation work and defeats generic
/// precomputed tables; it deliberately gives every password exactly one key so
/// a second party can rebuild it from the password alone.
pub const KDF_SALT: &[u8] = b"peti-simpanan-salt";
