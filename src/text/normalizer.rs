/*!
 * Word normalization.
 *
 * A `CanonicalWord` is the only key used for dictionary lookups, storage and
 * cross-occurrence synchronization. Every component obtains it through
 * [`normalize`]; there is no other path.
 */

use std::borrow::Borrow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}]").expect("non-letter pattern is valid"));

/// Lowercase, letters-only projection of a word's surface text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalWord(String);

impl CanonicalWord {
    /// Borrow the key text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty key is valid but must never reach the store or translator
    pub fn is_actionable(&self) -> bool {
        !self.0.is_empty()
    }

    /// Wrap text that is already canonical (e.g. keys read back from the store)
    pub(crate) fn from_canonical(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for CanonicalWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalWord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CanonicalWord {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalWord {
    fn from(text: &str) -> Self {
        normalize(text)
    }
}

/// Lowercase, then strip every character outside the Unicode letter category.
///
/// Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(surface: &str) -> CanonicalWord {
    let lowered = surface.to_lowercase();
    CanonicalWord(NON_LETTER.replace_all(&lowered, "").into_owned())
}
