//! Concrete storage and crypto implementations for commitsafe.
//! Values are sealed with AES-256-GCM under Argon2id-derived keys; per-file passphrases
//! live in a plain-text key store under the user's home directory.

pub mod codec;
pub mod key_resolver;
pub mod key_store;
pub mod passphrase;
pub mod transformer;

pub use codec::{AesGcmCodec, KdfParams};
pub use key_resolver::{resolve_key, KeyOrigin, ResolvedKey};
pub use key_store::{KeyStore, KeyStoreError};
pub use transformer::{locate, FileOutcome, FileTransformer, TransformerError};
