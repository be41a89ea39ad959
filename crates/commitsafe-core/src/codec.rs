use thiserror::Error;

/// Errors produced by secret codec implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The token is not a well-formed ciphertext blob.
    #[error("malformed token: {reason}")]
    MalformedToken { reason: String },
    /// Authentication failed: wrong passphrase or tampered token.
    #[error("decryption failed: wrong key or corrupted value")]
    DecryptionFailed,
    /// Decrypted bytes are not valid UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
    /// Key derivation or cipher failure while encrypting.
    #[error("encryption failed: {reason}")]
    EncryptionFailed { reason: String },
}

/// Contract for turning a plaintext value into a self-describing ciphertext blob and back.
///
/// Blobs never include the `encrypted::` marker; callers add and strip it. Encryption is
/// expected to be non-deterministic, and implementations must not be asked to encrypt a
/// value that is already a token.
pub trait SecretCodec: Send + Sync {
    /// Encrypt `plaintext` under `passphrase`, returning a printable blob.
    fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CodecError>;

    /// Decrypt a blob produced by [`SecretCodec::encrypt`] with the same passphrase.
    fn decrypt(&self, blob: &str, passphrase: &str) -> Result<String, CodecError>;
}
