use thiserror::Error;

/// What to do with the assignment values of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Encrypt,
    Decrypt,
}

/// Invalid combination of action flags.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Cannot encrypt and decrypt at the same time")]
    ConflictingAction,
    #[error("Either -e | --encrypt or -d | --decrypt option is required")]
    MissingAction,
}

impl Action {
    /// Resolve the requested action from the two user-facing flags.
    pub fn from_flags(encrypt: bool, decrypt: bool) -> Result<Self, ActionError> {
        match (encrypt, decrypt) {
            (true, true) => Err(ActionError::ConflictingAction),
            (true, false) => Ok(Action::Encrypt),
            (false, true) => Ok(Action::Decrypt),
            (false, false) => Err(ActionError::MissingAction),
        }
    }

    /// Noun used in prompts, e.g. "Enter key for file .env encryption:".
    pub fn noun(self) -> &'static str {
        match self {
            Action::Encrypt => "encryption",
            Action::Decrypt => "decryption",
        }
    }
}
