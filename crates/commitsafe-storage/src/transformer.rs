use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use commitsafe_core::{
    action::Action,
    codec::SecretCodec,
    transform::{transform_body, TransformError},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformerError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },
    #[error("{path}: {reason}")]
    Io { path: String, reason: String },
    #[error("{path}: {source}")]
    Transform {
        path: String,
        #[source]
        source: TransformError,
    },
}

/// What processing a single file did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Number of values encrypted or decrypted.
    pub changed: usize,
    /// Whether the file was rewritten on disk.
    pub written: bool,
}

/// Encrypts or decrypts the assignment values of env files in place.
pub struct FileTransformer<C: SecretCodec> {
    codec: C,
}

impl<C: SecretCodec> FileTransformer<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Rewrite `path` with every assignment value encrypted or decrypted under `passphrase`.
    ///
    /// The new body is computed completely before anything is written, so a decryption
    /// failure leaves the file untouched. Unchanged files are not rewritten.
    #[instrument(skip_all, fields(path = %path.display(), ?action))]
    pub fn process(
        &self,
        path: &Path,
        action: Action,
        passphrase: &str,
    ) -> Result<FileOutcome, TransformerError> {
        let body = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => TransformerError::FileNotFound {
                path: display_absolute(path),
            },
            _ => io_err(path, err),
        })?;

        let transformed = transform_body(&body, action, &self.codec, passphrase).map_err(
            |source| TransformerError::Transform {
                path: path.display().to_string(),
                source,
            },
        )?;

        let written = transformed.changed > 0;
        if written {
            write_atomic(path, &transformed.body)?;
            info!(changed = transformed.changed, "file rewritten");
        } else {
            debug!("nothing to change");
        }

        Ok(FileOutcome {
            path: path.to_path_buf(),
            changed: transformed.changed,
            written,
        })
    }
}

/// Resolve `path` to the absolute, symlink-free form used as key-store identity.
///
/// Fails with [`TransformerError::FileNotFound`] when the file does not exist.
pub fn locate(path: &Path) -> Result<PathBuf, TransformerError> {
    fs::canonicalize(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => TransformerError::FileNotFound {
            path: display_absolute(path),
        },
        _ => io_err(path, err),
    })
}

/// Replace `path` with `body` via a sibling temp file and rename, keeping permissions.
fn write_atomic(path: &Path, body: &str) -> Result<(), TransformerError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map_err(|e| io_err(path, e))?.permissions();

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| io_err(path, e))?;
    tmp.write_all(body.as_bytes()).map_err(|e| io_err(path, e))?;
    tmp.flush().map_err(|e| io_err(path, e))?;
    fs::set_permissions(tmp.path(), permissions).map_err(|e| io_err(path, e))?;
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn io_err(path: &Path, err: std::io::Error) -> TransformerError {
    TransformerError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use commitsafe_core::codec::CodecError;

    use super::*;
    use crate::codec::{AesGcmCodec, KdfParams};

    fn transformer() -> FileTransformer<AesGcmCodec> {
        FileTransformer::new(AesGcmCodec::new(KdfParams::new(64, 1, 1)))
    }

    #[test]
    fn encrypt_then_decrypt_restores_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        let original = "FOO=bar\n# comment\n\nEMPTY=\n";
        fs::write(&path, original).unwrap();

        let t = transformer();
        let enc = t.process(&path, Action::Encrypt, "pw").expect("encrypt");
        assert_eq!(enc.changed, 2);
        let encrypted = fs::read_to_string(&path).unwrap();
        assert!(encrypted.starts_with("FOO=encrypted::"));
        assert!(encrypted.contains("\n# comment\n\nEMPTY=encrypted::"));

        t.process(&path, Action::Decrypt, "pw").expect("decrypt");
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.env");

        let err = transformer()
            .process(&missing, Action::Encrypt, "pw")
            .expect_err("missing");
        assert!(matches!(err, TransformerError::FileNotFound { .. }));
        assert!(matches!(
            locate(&missing),
            Err(TransformerError::FileNotFound { .. })
        ));
    }

    #[test]
    fn wrong_key_leaves_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        fs::write(&path, "A=1\nB=2").unwrap();

        let t = transformer();
        t.process(&path, Action::Encrypt, "right").unwrap();
        let encrypted = fs::read_to_string(&path).unwrap();

        let err = t.process(&path, Action::Decrypt, "wrong").unwrap_err();
        assert!(matches!(
            err,
            TransformerError::Transform {
                source: TransformError::Codec {
                    line: 1,
                    source: CodecError::DecryptionFailed
                },
                ..
            }
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), encrypted);
    }

    #[test]
    fn unchanged_file_is_not_rewritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.env");
        fs::write(&path, "# only comments\n\n").unwrap();

        let outcome = transformer().process(&path, Action::Decrypt, "pw").unwrap();
        assert!(!outcome.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# only comments\n\n");
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        fs::write(&path, "A=1").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        transformer().process(&path, Action::Encrypt, "pw").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
