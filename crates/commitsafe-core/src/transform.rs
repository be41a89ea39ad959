//! Per-line encryption and decryption of an env file body.

use thiserror::Error;
use tracing::debug;

use crate::{
    action::Action,
    codec::{CodecError, SecretCodec},
    line::{classify, is_token, EnvLine, TOKEN_PREFIX},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("line {line}: {source}")]
    Codec {
        /// 1-based line number.
        line: usize,
        #[source]
        source: CodecError,
    },
}

/// Result of transforming a whole body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub body: String,
    /// Number of assignment lines whose value was encrypted or decrypted.
    pub changed: usize,
}

/// Apply `action` to every assignment value in `body`.
///
/// Lines are split on `\n` and joined back with `\n`, so a trailing newline (or its
/// absence) survives. A `\r` before the newline is kept on rewritten lines too. Values
/// already carrying the token prefix are never encrypted again, and plain values are
/// left alone on decrypt. The first codec failure aborts the whole body.
pub fn transform_body<C>(
    body: &str,
    action: Action,
    codec: &C,
    passphrase: &str,
) -> Result<Transformed, TransformError>
where
    C: SecretCodec + ?Sized,
{
    let mut out = Vec::new();
    let mut changed = 0;

    for (idx, raw) in body.split('\n').enumerate() {
        let (content, cr) = match raw.strip_suffix('\r') {
            Some(content) => (content, "\r"),
            None => (raw, ""),
        };

        let rewritten = match (classify(content), action) {
            (EnvLine::Assignment { key, value }, Action::Encrypt) if !is_token(value) => {
                let blob = codec
                    .encrypt(value, passphrase)
                    .map_err(|source| TransformError::Codec {
                        line: idx + 1,
                        source,
                    })?;
                Some(format!("{key}={TOKEN_PREFIX}{blob}{cr}"))
            }
            (line @ EnvLine::Assignment { key, .. }, Action::Decrypt) => match line.token() {
                Some(blob) => {
                    let plain = codec.decrypt(blob, passphrase).map_err(|source| {
                        TransformError::Codec {
                            line: idx + 1,
                            source,
                        }
                    })?;
                    Some(format!("{key}={plain}{cr}"))
                }
                None => None,
            },
            _ => None,
        };

        match rewritten {
            Some(line) => {
                debug!(line = idx + 1, "rewrote assignment");
                changed += 1;
                out.push(line);
            }
            None => out.push(raw.to_string()),
        }
    }

    Ok(Transformed {
        body: out.join("\n"),
        changed,
    })
}
