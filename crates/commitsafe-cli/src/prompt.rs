use std::io::ErrorKind;

use async_trait::async_trait;
use commitsafe_core::prompt::{KeyPrompt, PromptError};

/// Reads a passphrase from the controlling terminal without echoing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

#[async_trait]
impl KeyPrompt for TerminalPrompt {
    async fn ask(&self, message: &str) -> Result<Option<String>, PromptError> {
        let message = format!("{message} ");
        // rpassword blocks on the tty; keep it off the runtime thread.
        let answer = tokio::task::spawn_blocking(move || rpassword::prompt_password(message))
            .await
            .map_err(|e| PromptError::Failed {
                reason: e.to_string(),
            })?;

        match answer {
            Ok(passphrase) => Ok(Some(passphrase)),
            Err(err) if err.kind() == ErrorKind::Interrupted => Err(PromptError::Cancelled),
            Err(err) => Err(PromptError::Failed {
                reason: err.to_string(),
            }),
        }
    }
}
