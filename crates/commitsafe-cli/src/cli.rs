use std::path::PathBuf;

use clap::Parser;

/// CLI surface definition.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "commitsafe",
    about = "Encrypt and decrypt environment variables in a file",
    version
)]
pub struct Cli {
    /// List given files and their keys.
    #[arg(short, long)]
    pub list: bool,

    /// Encrypt environment variables in a file.
    #[arg(short, long)]
    pub encrypt: bool,

    /// Decrypt environment variables in a file.
    #[arg(short, long)]
    pub decrypt: bool,

    /// Key to encrypt or decrypt with; defaults to the keys stored in ~/.commitsafe.
    #[arg(short, long, value_name = "KEY", conflicts_with = "list")]
    pub key: Option<String>,

    /// Write a default config file if none exists, then exit.
    #[arg(long)]
    pub init_config: bool,

    /// Files to encrypt or decrypt.
    #[arg(value_name = "FILES", required_unless_present = "init_config")]
    pub files: Vec<PathBuf>,
}
