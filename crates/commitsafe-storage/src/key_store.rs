use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// File name of the key store inside the home directory.
pub const DEFAULT_FILE_NAME: &str = ".commitsafe";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyStoreError {
    /// The store file does not exist (only reported by [`KeyStore::load_existing`]).
    #[error("No keyfile found at {path}")]
    Missing { path: String },
    /// Reading or writing the store file failed.
    #[error("key store {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Mapping from absolute file path to passphrase, persisted as `PATH=PASSPHRASE` lines.
///
/// Both sides are stored verbatim apart from backslash escapes (`\\`, `\n`, `\r`, and
/// `\=` inside the path), so surrounding whitespace or quotes survive a reload unchanged. Lines
/// without an unescaped `=` are kept as they are and written back on the next persist.
///
/// The whole file is rewritten on every mutation; concurrent writers are not
/// coordinated and the last one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    unparsed: Vec<String>,
}

impl KeyStore {
    /// Load the store, creating an empty file first if none exists.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(body) => Ok(Self::from_body(path, &body)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("key store missing, creating empty file");
                let store = Self {
                    path: path.to_path_buf(),
                    entries: BTreeMap::new(),
                    unparsed: Vec::new(),
                };
                store.persist()?;
                Ok(store)
            }
            Err(err) => Err(io_err(path, err)),
        }
    }

    /// Load the store without creating it; a missing file is an error.
    pub fn load_existing(path: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(body) => Ok(Self::from_body(path, &body)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(KeyStoreError::Missing {
                path: path.display().to_string(),
            }),
            Err(err) => Err(io_err(path, err)),
        }
    }

    fn from_body(path: &Path, body: &str) -> Self {
        let mut entries = BTreeMap::new();
        let mut unparsed = Vec::new();
        for (idx, raw) in body.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().is_empty() {
                continue;
            }
            match parse_entry(line) {
                // later duplicates win
                Some((file, passphrase)) => {
                    entries.insert(file, passphrase);
                }
                None => {
                    warn!(line = idx + 1, "unrecognised key store line kept as is");
                    unparsed.push(line.to_string());
                }
            }
        }
        Self {
            path: path.to_path_buf(),
            entries,
            unparsed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, file: &str) -> Option<&str> {
        self.entries.get(file).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `passphrase` for `file`, replacing any previous one, and rewrite the store.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn set_and_persist(
        &mut self,
        file: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Result<(), KeyStoreError> {
        self.entries.insert(file.into(), passphrase.into());
        self.persist()?;
        debug!(entries = self.entries.len(), "key store written");
        Ok(())
    }

    fn render(&self) -> String {
        let entries = self
            .entries
            .iter()
            .map(|(file, passphrase)| {
                format!("{}={}", escape(file, true), escape(passphrase, false))
            });
        self.unparsed
            .iter()
            .cloned()
            .chain(entries)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn persist(&self) -> Result<(), KeyStoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| io_err(&self.path, e))?;

        // NamedTempFile is created owner-only, which the store keeps after the rename.
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| io_err(&self.path, e))?;
        tmp.write_all(self.render().as_bytes())
            .map_err(|e| io_err(&self.path, e))?;
        tmp.flush().map_err(|e| io_err(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| io_err(&self.path, e.error))?;
        Ok(())
    }
}

fn escape(raw: &str, in_path: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '=' if in_path => out.push_str("\\="),
            c => out.push(c),
        }
    }
    out
}

/// Split a stored line at its first unescaped `=` and undo [`escape`] on both halves.
fn parse_entry(line: &str) -> Option<(String, String)> {
    let mut file = String::new();
    let mut passphrase = String::new();
    let mut in_path = true;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        let target = if in_path { &mut file } else { &mut passphrase };
        match c {
            '\\' => match chars.next() {
                Some('\\') => target.push('\\'),
                Some('n') => target.push('\n'),
                Some('r') => target.push('\r'),
                Some('=') => target.push('='),
                Some(other) => {
                    target.push('\\');
                    target.push(other);
                }
                None => target.push('\\'),
            },
            '=' if in_path => in_path = false,
            c => target.push(c),
        }
    }

    (!in_path && !file.is_empty()).then_some((file, passphrase))
}

fn io_err(path: &Path, err: std::io::Error) -> KeyStoreError {
    KeyStoreError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
