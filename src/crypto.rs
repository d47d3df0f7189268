use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::rngs::OsRng;
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encryption key must be exactly 32 bytes")]
    InvalidKey,
    #[error("encrypt failure")]
    Encrypt,
    #[error("ciphertext is malformed")]
    Malformed,
    #[error("decrypt failure")]
    Decrypt,
}

/// Reversible encryption for passport numbers. Injected as a trait object so
/// storage code can be exercised with a deterministic stand-in.
pub trait PassportCodec: Send + Sync {
    fn encrypt(&self, plain: &str) -> Result<String, CodecError>;
    fn decrypt(&self, blob: &str) -> Result<String, CodecError>;
}

/// AES-256-GCM with a random 96-bit nonce prepended to the ciphertext; the
/// whole blob travels as URL-safe base64.
pub struct AesPassportCipher {
    cipher: Aes256Gcm,
}

impl AesPassportCipher {
    pub fn new(key: &[u8]) -> Result<Self, CodecError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CodecError::InvalidKey)?;
        Ok(Self { cipher })
    }
}

impl PassportCodec for AesPassportCipher {
    fn encrypt(&self, plain: &str) -> Result<String, CodecError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plain.as_bytes())
            .map_err(|_| CodecError::Encrypt)?;

        let mut blob = nonce.to_vec();
        blob.extend_from_slice(&sealed);
        Ok(URL_SAFE.encode(blob))
    }

    fn decrypt(&self, blob: &str) -> Result<String, CodecError> {
        let raw = URL_SAFE.decode(blob).map_err(|_| CodecError::Malformed)?;
        if raw.len() <= NONCE_LEN {
            return Err(CodecError::Malformed);
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CodecError::Decrypt)?;
        String::from_utf8(plain).map_err(|_| CodecError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn cipher() -> AesPassportCipher {
        AesPassportCipher::new(KEY).expect("32-byte key")
    }

    #[test]
    fn encrypt_and_decrypt_roundtrip() {
        let c = cipher();
        let blob = c.encrypt("1234 567890").expect("encrypt should succeed");
        assert_eq!(c.decrypt(&blob).expect("decrypt should succeed"), "1234 567890");
    }

    #[test]
    fn encrypting_twice_produces_distinct_blobs() {
        let c = cipher();
        let a = c.encrypt("1234 567890").unwrap();
        let b = c.encrypt("1234 567890").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn decrypt_rejects_a_foreign_key() {
        let blob = cipher().encrypt("1234 567890").unwrap();
        let other = AesPassportCipher::new(b"ffffffffffffffffffffffffffffffff").unwrap();
        assert!(matches!(other.decrypt(&blob), Err(CodecError::Decrypt)));
    }

    #[test]
    fn decrypt_rejects_tampered_ciphertext() {
        let c = cipher();
        let blob = c.encrypt("1234 567890").unwrap();
        let mut raw = URL_SAFE.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        assert!(matches!(c.decrypt(&URL_SAFE.encode(raw)), Err(CodecError::Decrypt)));
    }

    #[test]
    fn decrypt_rejects_garbage_input() {
        let c = cipher();
        assert!(matches!(c.decrypt("not base64!!"), Err(CodecError::Malformed)));
        assert!(matches!(c.decrypt("dG9vc2hvcnQ="), Err(CodecError::Malformed)));
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        assert!(matches!(
            AesPassportCipher::new(b"short"),
            Err(CodecError::InvalidKey)
        ));
    }
}
