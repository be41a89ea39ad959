use std::{ffi::OsString, path::PathBuf};

use color_eyre::Result;
use commitsafe_storage::key_store::DEFAULT_FILE_NAME;
use dirs::home_dir;
use tracing::debug;

use crate::config::Config;

/// Environment variable overriding the key store location.
pub const KEYSTORE_ENV: &str = "COMMITSAFE_KEYSTORE";

/// Resolve the default key store path: `~/.commitsafe`.
pub fn default_keystore_path() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| color_eyre::eyre::eyre!("no home dir available"))?;
    Ok(home.join(DEFAULT_FILE_NAME))
}

/// Key store path for this invocation: environment override, then config, then default.
pub fn keystore_path(config: &Config) -> Result<PathBuf> {
    resolve(std::env::var_os(KEYSTORE_ENV), config)
}

fn resolve(env_override: Option<OsString>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = env_override.filter(|p| !p.is_empty()) {
        debug!(?path, "using key store from environment");
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = &config.keystore_path {
        debug!(?path, "using key store from config");
        return Ok(path.clone());
    }
    default_keystore_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_beats_config() {
        let config = Config {
            keystore_path: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        let path = resolve(Some(OsString::from("/from/env")), &config).unwrap();
        assert_eq!(path, PathBuf::from("/from/env"));
    }

    #[test]
    fn config_beats_default() {
        let config = Config {
            keystore_path: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        assert_eq!(
            resolve(Some(OsString::new()), &config).unwrap(),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn default_lives_in_home() {
        if let Ok(path) = resolve(None, &Config::default()) {
            assert!(path.ends_with(DEFAULT_FILE_NAME));
        }
    }
}
