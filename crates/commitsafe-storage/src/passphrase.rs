use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

/// Length of generated passphrases.
pub const GENERATED_LEN: usize = 128;

/// Generate a passphrase of [`GENERATED_LEN`] characters drawn uniformly from `[A-Za-z0-9]`.
pub fn generate_passphrase() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(GENERATED_LEN)
        .map(char::from)
        .collect()
}
