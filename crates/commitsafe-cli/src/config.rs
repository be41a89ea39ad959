use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use color_eyre::{eyre::eyre, Result};
use commitsafe_storage::KdfParams;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/commitsafe/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Override for the key store location (defaults to `~/.commitsafe`).
    pub keystore_path: Option<PathBuf>,
    /// Ask for a passphrase when a file has no stored key; otherwise generate one.
    pub prompt: bool,
    /// Argon2id cost for newly encrypted values.
    pub kdf: KdfConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keystore_path: None,
            prompt: true,
            kdf: KdfConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct KdfConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        let params = KdfParams::default();
        Self {
            memory_kib: params.memory_kib,
            iterations: params.iterations,
            parallelism: params.parallelism,
        }
    }
}

impl From<KdfConfig> for KdfParams {
    fn from(cfg: KdfConfig) -> Self {
        KdfParams::new(cfg.memory_kib, cfg.iterations, cfg.parallelism)
    }
}

/// Read `config.toml` from the platform config directory.
pub fn load() -> Result<Config> {
    load_from_path(default_path()?)
}

/// Parse the config at `path`. An absent or blank file means all defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(eyre!("reading config {}: {err}", path.display())),
    };
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    toml::from_str(&contents).map_err(|err| eyre!("parsing config {}: {err}", path.display()))
}

/// `<config_dir>/commitsafe/config.toml`, e.g. `~/.config/commitsafe/config.toml` on Linux.
pub fn default_path() -> Result<PathBuf> {
    config_dir()
        .map(|dir| dir.join("commitsafe").join("config.toml"))
        .ok_or_else(|| eyre!("cannot locate a config directory for this user"))
}

/// Write the given config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_to_path_if_missing(config, &default_path()?)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
