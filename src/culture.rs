use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ LocalizerError, Result };

// Primary language subtag followed by optional region/script subtags,
// separated by '-' or '_' ("en", "en-US", "tr_TR", "zh-Hant-TW").
static CULTURE_RE: Lazy<Regex> = Lazy::new(||
    Regex::new(r"^([A-Za-z]{2,8})(?:[-_][A-Za-z0-9]{1,8})*$").unwrap()
);

/// A parsed culture identifier.
///
/// Only the [`token`](Culture::token) takes part in file selection, so
/// `"en"`, `"en-US"` and `"EN_gb"` all address the same resource file.
///
/// # Example
///
/// ```rust
/// use bevy_resource_localizer::Culture;
///
/// let culture = Culture::parse("tr_TR").unwrap();
/// assert_eq!(culture.tag(), "tr-TR");
/// assert_eq!(culture.token(), "tr");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Culture {
    tag: String,
    token: String,
}

impl Culture {
    /// Parses a raw culture token as supplied by the host.
    ///
    /// Surrounding whitespace is ignored. Anything that is not a language
    /// tag (empty strings, dots, path separators) is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let captures = CULTURE_RE
            .captures(trimmed)
            .ok_or_else(|| LocalizerError::InvalidCulture(raw.to_string()))?;

        Ok(Self {
            tag: trimmed.replace('_', "-"),
            token: captures[1].to_ascii_lowercase(),
        })
    }

    /// The normalized tag, with `_` separators turned into `-`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The lowercased primary language subtag used in file names.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether both cultures resolve to the same resource file.
    pub fn same_file_as(&self, other: &Culture) -> bool {
        self.token == other.token
    }
}

/// English, used when a configured culture cannot be parsed.
impl Default for Culture {
    fn default() -> Self {
        Self { tag: "en".to_string(), token: "en".to_string() }
    }
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}
