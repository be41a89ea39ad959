use std::{
    io::Write,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use commitsafe_core::{action::Action, codec::SecretCodec, prompt::KeyPrompt};
use commitsafe_storage::{
    locate, resolve_key, AesGcmCodec, FileTransformer, KeyOrigin, KeyStore, ResolvedKey,
};
use tracing::debug;

use crate::{cli::Cli, config::Config};

/// Execute a parsed command line against the given key store.
pub async fn dispatch(
    cli: &Cli,
    config: &Config,
    store_path: &Path,
    prompt: &dyn KeyPrompt,
    out: &mut impl Write,
) -> Result<()> {
    if cli.list {
        return list(&cli.files, store_path, out);
    }

    let action = Action::from_flags(cli.encrypt, cli.decrypt)?;
    let transformer = FileTransformer::new(AesGcmCodec::new(config.kdf.into()));
    transform(
        &cli.files,
        action,
        cli.key.as_deref(),
        store_path,
        prompt,
        &transformer,
        out,
    )
    .await
}

/// Print the stored passphrase of every given file.
pub fn list(files: &[PathBuf], store_path: &Path, out: &mut impl Write) -> Result<()> {
    let store = KeyStore::load_existing(store_path)?;

    for file in files {
        let name = display_name(file);
        let identity = identity(file);
        match store.get(&identity) {
            Some(passphrase) => writeln!(out, "--- {name} --- \n\n{passphrase}\n")?,
            None => writeln!(out, "No key found for file: {name}")?,
        }
    }

    writeln!(out, "--- END ---")?;
    Ok(())
}

enum KeySource {
    Explicit(String),
    Store(KeyStore),
}

/// Encrypt or decrypt `files` in order, stopping at the first failure.
pub async fn transform<C: SecretCodec>(
    files: &[PathBuf],
    action: Action,
    explicit_key: Option<&str>,
    store_path: &Path,
    prompt: &dyn KeyPrompt,
    transformer: &FileTransformer<C>,
    out: &mut impl Write,
) -> Result<()> {
    let mut source = match explicit_key {
        Some(key) => KeySource::Explicit(key.to_string()),
        None => KeySource::Store(KeyStore::load(store_path)?),
    };

    for file in files {
        let name = display_name(file);
        let absolute = locate(file)?;

        let key = match &mut source {
            KeySource::Explicit(key) => ResolvedKey::explicit(key.clone()),
            KeySource::Store(store) => {
                let message = format!("Enter key for file {name} {}:", action.noun());
                let identity = absolute.to_string_lossy();
                let key = resolve_key(store, &identity, &message, prompt).await?;
                if matches!(key.origin, KeyOrigin::Generated { prompt_failed: true }) {
                    writeln!(out, "Auto generating key for file")?;
                }
                key
            }
        };
        debug!(file = %absolute.display(), origin = ?key.origin, "key resolved");

        writeln!(out, "Processing file: {name}")?;
        let outcome = transformer.process(&absolute, action, &key.passphrase)?;
        debug!(
            file = %name,
            changed = outcome.changed,
            written = outcome.written,
            "file processed"
        );
    }

    Ok(())
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

/// Key-store identity of `file`; falls back to a lexical absolute path when it does not exist.
fn identity(file: &Path) -> String {
    locate(file)
        .ok()
        .or_else(|| std::path::absolute(file).ok())
        .unwrap_or_else(|| file.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
