use commitsafe_core::prompt::KeyPrompt;
use tracing::{debug, warn};

use crate::{
    key_store::{KeyStore, KeyStoreError},
    passphrase::generate_passphrase,
};

/// Where the passphrase for a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Given on the command line; never persisted.
    Explicit,
    /// Already recorded in the key store.
    Stored,
    /// Typed in by the user and recorded.
    Prompted,
    /// Generated because the prompt produced nothing, then recorded.
    Generated {
        /// The prompt was cancelled or failed rather than answered empty.
        prompt_failed: bool,
    },
}

/// The passphrase applied to one file for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub passphrase: String,
    pub origin: KeyOrigin,
}

impl ResolvedKey {
    pub fn explicit(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
            origin: KeyOrigin::Explicit,
        }
    }
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("passphrase", &"<redacted>")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Look up the passphrase for `file` in `store`, asking `prompt` when there is none.
///
/// A cancelled or failed prompt, or an empty answer, falls back to a generated
/// passphrase. Whatever is obtained is written to the store before it is returned.
pub async fn resolve_key(
    store: &mut KeyStore,
    file: &str,
    prompt_message: &str,
    prompt: &dyn KeyPrompt,
) -> Result<ResolvedKey, KeyStoreError> {
    if let Some(existing) = store.get(file) {
        debug!(file, "using stored key");
        return Ok(ResolvedKey {
            passphrase: existing.to_string(),
            origin: KeyOrigin::Stored,
        });
    }

    let (answer, prompt_failed) = match prompt.ask(prompt_message).await {
        Ok(answer) => (answer, false),
        Err(err) => {
            warn!(file, "prompt unavailable, generating key: {err}");
            (None, true)
        }
    };

    let resolved = match answer.filter(|a| !a.is_empty()) {
        Some(passphrase) => ResolvedKey {
            passphrase,
            origin: KeyOrigin::Prompted,
        },
        None => ResolvedKey {
            passphrase: generate_passphrase(),
            origin: KeyOrigin::Generated { prompt_failed },
        },
    };

    store.set_and_persist(file, resolved.passphrase.clone())?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use commitsafe_core::prompt::{FixedPrompt, PromptError};

    use super::*;
    use crate::passphrase::GENERATED_LEN;

    fn temp_store() -> (tempfile::TempDir, KeyStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KeyStore::load(dir.path().join("store")).expect("load");
        (dir, store)
    }

    #[tokio::test]
    async fn stored_key_wins_without_prompting() {
        let (_dir, mut store) = temp_store();
        store.set_and_persist("/f", "known").unwrap();

        let prompt = FixedPrompt::failing(PromptError::Failed {
            reason: "must not be asked".into(),
        });
        let key = resolve_key(&mut store, "/f", "msg", &prompt).await.unwrap();

        assert_eq!(key.passphrase, "known");
        assert_eq!(key.origin, KeyOrigin::Stored);
    }

    #[tokio::test]
    async fn prompted_key_is_persisted() {
        let (_dir, mut store) = temp_store();
        let prompt = FixedPrompt::answering("typed");

        let key = resolve_key(&mut store, "/f", "msg", &prompt).await.unwrap();
        assert_eq!(key.origin, KeyOrigin::Prompted);

        let reloaded = KeyStore::load(store.path()).unwrap();
        assert_eq!(reloaded.get("/f"), Some("typed"));
    }

    #[tokio::test]
    async fn prompted_key_is_stored_byte_for_byte() {
        let (_dir, mut store) = temp_store();
        let file = "/home/me/proj#1/.env";
        let prompt = FixedPrompt::answering(" my pass ");

        resolve_key(&mut store, file, "msg", &prompt).await.unwrap();

        let mut reloaded = KeyStore::load(store.path()).unwrap();
        let again = resolve_key(&mut reloaded, file, "msg", &FixedPrompt::silent())
            .await
            .unwrap();
        assert_eq!(again.origin, KeyOrigin::Stored);
        assert_eq!(again.passphrase, " my pass ");
    }

    #[tokio::test]
    async fn cancelled_or_empty_prompt_generates_key() {
        for (prompt, prompt_failed) in [
            (FixedPrompt::failing(PromptError::Cancelled), true),
            (
                FixedPrompt::failing(PromptError::Failed {
                    reason: "no tty".into(),
                }),
                true,
            ),
            (FixedPrompt::silent(), false),
            (FixedPrompt::answering(""), false),
        ] {
            let (_dir, mut store) = temp_store();
            let key = resolve_key(&mut store, "/f", "msg", &prompt).await.unwrap();

            assert_eq!(key.origin, KeyOrigin::Generated { prompt_failed });
            assert_eq!(key.passphrase.len(), GENERATED_LEN);
            let reloaded = KeyStore::load(store.path()).unwrap();
            assert_eq!(reloaded.get("/f"), Some(key.passphrase.as_str()));
        }
    }

    #[test]
    fn debug_output_hides_passphrase() {
        let rendered = format!("{:?}", ResolvedKey::explicit("topsecret"));
        assert!(!rendered.contains("topsecret"));
    }
}
