//! Core abstractions for commitsafe: env-line classification, the secret codec and
//! key prompt contracts, and the pure per-line transformation.
//! No I/O happens here; concrete crypto and file handling live in `commitsafe-storage`.

pub mod action;
pub mod codec;
pub mod line;
pub mod prompt;
pub mod transform;

pub use action::{Action, ActionError};
pub use codec::{CodecError, SecretCodec};
pub use line::{classify, EnvLine, TOKEN_PREFIX};
pub use prompt::{FixedPrompt, KeyPrompt, PromptError};
pub use transform::{transform_body, TransformError, Transformed};
