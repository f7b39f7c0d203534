//! Label key filtering.

use regex::Regex;

/// Compiled filter deciding which label keys get published.
///
/// The pattern is searched anywhere in the key (not anchored). An empty
/// pattern matches every key.
#[derive(Debug, Clone)]
pub struct LabelWhitelist {
    pattern: Regex,
}

impl Default for LabelWhitelist {
    fn default() -> Self {
        Self::match_all()
    }
}

impl LabelWhitelist {
    /// Compile a whitelist from a regular expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// A whitelist that accepts every key.
    pub fn match_all() -> Self {
        Self {
            pattern: Regex::new("").expect("empty pattern is valid"),
        }
    }

    /// Source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}
