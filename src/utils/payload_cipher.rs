use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Sealed Payloads - AES-256-GCM over JSON bodies
// ============================================================================
//
// Wire form: {"payload": hex(nonce || ciphertext)}
// Key: SHA-256 of the shared secret.
//
// ============================================================================

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PayloadError {
    #[error("Sealed payloads are not enabled")]
    Disabled,

    #[error("Sealed payload is not valid hex")]
    InvalidEncoding,

    #[error("Sealed payload is too short")]
    Truncated,

    #[error("Sealed payload failed authentication")]
    Tampered,

    #[error("Could not seal payload")]
    Encryption,

    #[error("Sealed payload is not valid JSON: {0}")]
    InvalidJson(String),
}

/// JSON envelope carrying a sealed body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedEnvelope {
    pub payload: String,
}

#[derive(Clone)]
pub struct PayloadCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PayloadCipher(..)")
    }
}

impl PayloadCipher {
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    pub fn seal_bytes(&self, plaintext: &[u8]) -> Result<String, PayloadError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| PayloadError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    pub fn open_bytes(&self, sealed: &str) -> Result<Vec<u8>, PayloadError> {
        let raw = hex::decode(sealed.trim()).map_err(|_| PayloadError::InvalidEncoding)?;
        if raw.len() <= NONCE_LEN {
            return Err(PayloadError::Truncated);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| PayloadError::Tampered)
    }

    pub fn seal<T: Serialize>(&self, value: &T) -> Result<SealedEnvelope, PayloadError> {
        let json = serde_json::to_vec(value).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
        Ok(SealedEnvelope {
            payload: self.seal_bytes(&json)?,
        })
    }

    pub fn open<T: DeserializeOwned>(&self, envelope: &SealedEnvelope) -> Result<T, PayloadError> {
        let json = self.open_bytes(&envelope.payload)?;
        serde_json::from_slice(&json).map_err(|e| PayloadError::InvalidJson(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seal_and_open() {
        let cipher = PayloadCipher::from_secret("storefront-secret");
        let body = json!({"productId": "abc", "quantity": 3});

        let envelope = cipher.seal(&body).unwrap();
        assert!(!envelope.payload.contains("productId"));

        let opened: serde_json::Value = cipher.open(&envelope).unwrap();
        assert_eq!(opened, body);
    }

    #[test]
    fn test_nonce_makes_ciphertexts_differ() {
        let cipher = PayloadCipher::from_secret("s");
        assert_ne!(cipher.seal_bytes(b"same").unwrap(), cipher.seal_bytes(b"same").unwrap());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let sealed = PayloadCipher::from_secret("one").seal_bytes(b"hello").unwrap();
        let result = PayloadCipher::from_secret("two").open_bytes(&sealed);
        assert_eq!(result, Err(PayloadError::Tampered));
    }

    #[test]
    fn test_flipped_bit_is_rejected() {
        let cipher = PayloadCipher::from_secret("s");
        let mut raw = hex::decode(cipher.seal_bytes(b"hello").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        assert_eq!(cipher.open_bytes(&hex::encode(raw)), Err(PayloadError::Tampered));
    }

    #[test]
    fn test_bad_encoding_and_truncation() {
        let cipher = PayloadCipher::from_secret("s");
        assert_eq!(cipher.open_bytes("zz-not-hex"), Err(PayloadError::InvalidEncoding));
        assert_eq!(cipher.open_bytes("00ff"), Err(PayloadError::Truncated));
    }
}
