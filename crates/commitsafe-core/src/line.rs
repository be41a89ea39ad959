//! Dotenv-style line classification.
//!
//! A line is either a `KEY=VALUE` assignment or an opaque line (comment, blank, malformed)
//! that must be written back exactly as it was read.

/// Marker prepended to every encrypted value.
pub const TOKEN_PREFIX: &str = "encrypted::";

/// One classified line of an environment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvLine<'a> {
    /// A `KEY=VALUE` pair. `value` has surrounding whitespace and one pair of matching
    /// quotes removed.
    Assignment { key: &'a str, value: &'a str },
    /// Anything that is not an assignment; re-emitted verbatim.
    Opaque { raw: &'a str },
}

impl<'a> EnvLine<'a> {
    /// The encrypted blob carried by this line, if it is an assignment holding a token.
    pub fn token(&self) -> Option<&'a str> {
        match self {
            EnvLine::Assignment { value, .. } => value.strip_prefix(TOKEN_PREFIX),
            EnvLine::Opaque { .. } => None,
        }
    }
}

/// Classify a single line (without its line terminator).
///
/// Only the first `=` splits key from value, so values may contain `=` themselves. Keys
/// must be non-empty and free of `#` and quote characters; everything else is opaque.
pub fn classify(line: &str) -> EnvLine<'_> {
    let opaque = EnvLine::Opaque { raw: line };

    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return opaque;
    }

    let Some((raw_key, raw_value)) = trimmed.split_once('=') else {
        return opaque;
    };

    let key = raw_key.trim();
    if key.is_empty() || key.contains(['#', '"', '\'', '`']) {
        return opaque;
    }

    EnvLine::Assignment {
        key,
        value: unquote(raw_value.trim()),
    }
}

/// Whether a value already carries the encrypted marker.
pub fn is_token(value: &str) -> bool {
    value.starts_with(TOKEN_PREFIX)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
