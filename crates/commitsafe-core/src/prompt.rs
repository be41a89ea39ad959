use async_trait::async_trait;
use thiserror::Error;

/// Failure or cancellation of an interactive passphrase prompt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// The user aborted the prompt.
    #[error("prompt cancelled")]
    Cancelled,
    /// No terminal available or reading failed.
    #[error("prompt failed: {reason}")]
    Failed { reason: String },
}

/// Asks the user for the passphrase of a file (a terminal in production; canned answers in tests).
///
/// `Ok(None)` and `Ok(Some(""))` both mean "no passphrase given"; callers fall back to
/// generating one.
#[async_trait]
pub trait KeyPrompt: Send + Sync {
    async fn ask(&self, message: &str) -> Result<Option<String>, PromptError>;
}

/// Prompt double that always returns the same outcome.
#[derive(Debug, Clone)]
pub struct FixedPrompt {
    outcome: Result<Option<String>, PromptError>,
}

impl FixedPrompt {
    pub fn answering(passphrase: impl Into<String>) -> Self {
        Self {
            outcome: Ok(Some(passphrase.into())),
        }
    }

    /// A prompt that yields nothing, as when prompting is disabled.
    pub fn silent() -> Self {
        Self { outcome: Ok(None) }
    }

    pub fn failing(err: PromptError) -> Self {
        Self { outcome: Err(err) }
    }
}

#[async_trait]
impl KeyPrompt for FixedPrompt {
    async fn ask(&self, _message: &str) -> Result<Option<String>, PromptError> {
        self.outcome.clone()
    }
}
