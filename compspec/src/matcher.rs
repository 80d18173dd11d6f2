//! Prefix and equality matching with optional case and hyphen folding.

use std::borrow::Cow;

/// How typed words are compared against candidate values.
///
/// Built once at startup (see [`crate::config::Settings`]) and passed to
/// everything that filters candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Compare case-insensitively.
    pub ignore_case: bool,
    /// Treat `-` and `_` as the same character.
    pub map_hyphen_underscore: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ignore_case: true,
            map_hyphen_underscore: true,
        }
    }
}

impl MatchConfig {
    /// Exact comparison, no folding.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            ignore_case: false,
            map_hyphen_underscore: false,
        }
    }

    /// Apply the configured folding to `s`.
    #[must_use]
    pub fn normalize<'a>(&self, s: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(s);
        if self.ignore_case && out.chars().any(char::is_uppercase) {
            out = Cow::Owned(out.to_lowercase());
        }
        if self.map_hyphen_underscore && out.contains('-') {
            out = Cow::Owned(out.replace('-', "_"));
        }
        out
    }

    /// Whether `s` starts with `prefix` after folding.
    #[must_use]
    pub fn string_matches(&self, s: &str, prefix: &str) -> bool {
        self.normalize(s).starts_with(self.normalize(prefix).as_ref())
    }

    /// Whether `a` and `b` are equal after folding.
    #[must_use]
    pub fn string_equals(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }
}
