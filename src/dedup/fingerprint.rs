use sha2::{Digest, Sha256};
use std::fmt;

/// Number of normalized body characters that contribute to a fingerprint
pub const BODY_PREFIX_CHARS: usize = 500;

const FIELD_SEPARATOR: &str = "\u{1f}";

/// Hex-encoded SHA-256 digest identifying a document's content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Wraps an already computed hex digest, e.g. one read back from storage
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes text so cosmetic variants compare equal
///
/// Lowercases, unifies curly and straight quote variants to `'`, unifies en
/// and em dashes (and the minus sign) to `-`, collapses whitespace runs to a
/// single space, and trims.
pub fn normalize_for_fingerprint(text: &str) -> String {
    let unified: String = text
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '`' | '"'
            | '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}'
            | '\u{00BB}' => '\'',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    unified
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Computes the content fingerprint of a document
///
/// The body is truncated to [`BODY_PREFIX_CHARS`] characters after
/// normalization; a missing body hashes like an empty one.
///
/// # Examples
///
/// ```
/// use shoal::fingerprint;
///
/// let a = fingerprint("Bank  BCA", Some("Profit up."));
/// let b = fingerprint("bank bca", Some("Profit up."));
/// assert_eq!(a, b);
/// ```
pub fn fingerprint(title: &str, body: Option<&str>) -> ContentFingerprint {
    let title = normalize_for_fingerprint(title);
    let body = normalize_for_fingerprint(body.unwrap_or_default());
    let body_prefix: String = body.chars().take(BODY_PREFIX_CHARS).collect();

    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(FIELD_SEPARATOR.as_bytes());
    hasher.update(body_prefix.trim_end().as_bytes());
    ContentFingerprint(hex::encode(hasher.finalize()))
}
