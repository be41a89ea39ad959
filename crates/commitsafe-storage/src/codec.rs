//! Passphrase-based value encryption: Argon2id key derivation + AES-256-GCM.
//!
//! Blob layout (standard base64 of):
//! `version (1) | m_cost u32 LE | t_cost u32 LE | p_cost u32 LE | salt (16) | nonce (12) | ciphertext+tag`.
//! Everything needed to decrypt except the passphrase travels inside the blob.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use commitsafe_core::codec::{CodecError, SecretCodec};
use rand::{rngs::OsRng, RngCore};

const FORMAT_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = 1 + 3 * 4 + SALT_LEN + NONCE_LEN;

// Upper bounds accepted when decoding, so a crafted token cannot demand absurd work.
const MAX_MEMORY_KIB: u32 = 1 << 20;
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters used for newly encrypted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    fn within_limits(&self) -> bool {
        self.memory_kib <= MAX_MEMORY_KIB
            && self.iterations <= MAX_ITERATIONS
            && self.parallelism <= MAX_PARALLELISM
    }

    fn derive_cipher(&self, passphrase: &str, salt: &[u8]) -> Result<Aes256Gcm, String> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| format!("argon2 params: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; KEY_LEN];
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| format!("argon2: {e}"))?;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| format!("cipher init: {e}"));
        key.fill(0);
        cipher
    }
}

/// AES-256-GCM codec keyed by an Argon2id-stretched passphrase with a fresh salt per value.
///
/// A wrong passphrase fails GCM authentication and is reported as
/// [`CodecError::DecryptionFailed`] instead of producing garbled text.
#[derive(Debug, Clone, Default)]
pub struct AesGcmCodec {
    params: KdfParams,
}

impl AesGcmCodec {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }
}

impl SecretCodec for AesGcmCodec {
    fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CodecError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let cipher = self
            .params
            .derive_cipher(passphrase, &salt)
            .map_err(|reason| CodecError::EncryptionFailed { reason })?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CodecError::EncryptionFailed {
                reason: e.to_string(),
            })?;

        let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(&self.params.memory_kib.to_le_bytes());
        blob.extend_from_slice(&self.params.iterations.to_le_bytes());
        blob.extend_from_slice(&self.params.parallelism.to_le_bytes());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(blob))
    }

    fn decrypt(&self, blob: &str, passphrase: &str) -> Result<String, CodecError> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|e| malformed(e.to_string()))?;
        if bytes.len() < HEADER_LEN + TAG_LEN {
            return Err(malformed(format!(
                "expected at least {} bytes, got {}",
                HEADER_LEN + TAG_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != FORMAT_VERSION {
            return Err(malformed(format!(
                "unsupported format version {}",
                bytes[0]
            )));
        }

        let params = KdfParams::new(
            read_u32(&bytes, 1),
            read_u32(&bytes, 5),
            read_u32(&bytes, 9),
        );
        if !params.within_limits() {
            return Err(malformed("key derivation cost out of range".to_string()));
        }

        let (salt, rest) = bytes[13..].split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let cipher = params.derive_cipher(passphrase, salt).map_err(malformed)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CodecError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CodecError::InvalidUtf8)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

fn malformed(reason: String) -> CodecError {
    CodecError::MalformedToken { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_codec() -> AesGcmCodec {
        AesGcmCodec::new(KdfParams::new(64, 1, 1))
    }

    #[test]
    fn round_trip_recovers_plaintext() {
        let codec = fast_codec();
        for plain in ["bar", "", "p@ss=w0rd with spaces", "ünïcödé ✓"] {
            let blob = codec.encrypt(plain, "passphrase").expect("encrypt");
            assert_eq!(codec.decrypt(&blob, "passphrase").expect("decrypt"), plain);
        }
    }

    #[test]
    fn encryption_is_randomised() {
        let codec = fast_codec();
        let first = codec.encrypt("same", "key").unwrap();
        let second = codec.encrypt("same", "key").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn blob_is_single_line_base64_without_plaintext() {
        let blob = fast_codec().encrypt("hunter2", "key").unwrap();
        assert!(!blob.contains("hunter2"));
        assert!(blob
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')));
    }

    #[test]
    fn wrong_passphrase_is_detected() {
        let codec = fast_codec();
        let blob = codec.encrypt("secret", "right").unwrap();
        assert_eq!(codec.decrypt(&blob, "wrong"), Err(CodecError::DecryptionFailed));
    }

    #[test]
    fn tampered_ciphertext_is_detected() {
        let codec = fast_codec();
        let mut bytes = STANDARD.decode(codec.encrypt("secret", "k").unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = STANDARD.encode(bytes);
        assert_eq!(codec.decrypt(&tampered, "k"), Err(CodecError::DecryptionFailed));
    }

    #[test]
    fn decrypt_uses_params_embedded_in_blob() {
        let blob = AesGcmCodec::new(KdfParams::new(128, 2, 1))
            .encrypt("v", "k")
            .unwrap();
        // A codec configured differently still decrypts.
        assert_eq!(fast_codec().decrypt(&blob, "k").unwrap(), "v");
    }

    #[test]
    fn rejects_malformed_blobs() {
        let codec = fast_codec();
        assert!(matches!(
            codec.decrypt("not base64!", "k"),
            Err(CodecError::MalformedToken { .. })
        ));
        assert!(matches!(
            codec.decrypt("XYZ=", "k"),
            Err(CodecError::MalformedToken { .. })
        ));

        let mut bytes = STANDARD.decode(codec.encrypt("v", "k").unwrap()).unwrap();
        bytes[0] = 9;
        assert!(matches!(
            codec.decrypt(&STANDARD.encode(&bytes), "k"),
            Err(CodecError::MalformedToken { .. })
        ));
    }

    #[test]
    fn rejects_excessive_kdf_cost() {
        let codec = fast_codec();
        let mut bytes = STANDARD.decode(codec.encrypt("v", "k").unwrap()).unwrap();
        bytes[1..5].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = codec.decrypt(&STANDARD.encode(&bytes), "k").unwrap_err();
        assert!(matches!(err, CodecError::MalformedToken { .. }));
    }
}
