use std::fmt;

use serde::{Deserialize, Serialize};

/// Client-supplied crypto material. Stored and returned verbatim; the server
/// never decodes or inspects it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(String);

impl Blob {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Blob {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Blob {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes)", self.0.len())
    }
}

/// Stored in the backing store as bincode-encoded bytes.
/// `expires_at` mirrors the store entry's TTL; the store enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// base64(ciphertext || tag), as sent by the client.
    pub encrypted: Blob,
    /// base64(nonce), as sent by the client.
    pub iv: Blob,
    /// Unix timestamp (seconds) when the record was admitted.
    pub created_at: i64,
    /// Unix timestamp (seconds) after which the record is treated as absent.
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_serializes_as_plain_string() {
        let blob = Blob::from("3q2+7w==");
        assert_eq!(serde_json::to_string(&blob).unwrap(), "\"3q2+7w==\"");
    }

    #[test]
    fn blob_debug_hides_contents() {
        let blob = Blob::from("secret-ish");
        assert_eq!(format!("{blob:?}"), "Blob(10 bytes)");
    }
}
