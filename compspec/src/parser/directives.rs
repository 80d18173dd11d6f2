//! Parser directives carried on the first line of a spec.
//!
//! A spec may start with `//{"tab": 4, "line": 20, "file": "adb.rs"}`. The
//! line is an ordinary comment to the tokenizer; here it's decoded to adjust
//! tab width and the reported source location.

use serde::{Deserialize, Serialize};

use super::error::SpecError;

const DIRECTIVE_PREFIX: &str = "//{";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directives {
    /// Tabs in a spec are expanded to stops of this many columns.
    #[serde(rename = "tab")]
    pub tab_width: usize,
    /// Line number the spec text starts at, used in error locations.
    #[serde(rename = "line")]
    pub start_line: usize,
    /// File the spec is defined in, used in error locations.
    #[serde(rename = "file")]
    pub filename: String,
}

impl Default for Directives {
    fn default() -> Self {
        Directives {
            tab_width: 8,
            start_line: 1,
            filename: String::new(),
        }
    }
}

impl Directives {
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    #[must_use]
    pub fn with_start_line(mut self, line: usize) -> Self {
        self.start_line = line;
        self
    }

    #[must_use]
    pub fn with_tab_width(mut self, width: usize) -> Self {
        self.tab_width = width;
        self
    }

    /// Read directives from the first line of `spec`. Specs without a
    /// directives line get the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] if the directives line isn't a valid JSON
    /// object of known settings.
    pub fn extract(spec: &str) -> Result<Self, SpecError> {
        if !spec.starts_with(DIRECTIVE_PREFIX) {
            return Ok(Directives::default());
        }
        let end = spec.find('\n').unwrap_or(spec.len());
        let json = spec[2..end].trim_end_matches('\r');
        serde_json::from_str(json).map_err(|e| {
            SpecError::new(format!("invalid parser directive in line 1 {json}: {e}"))
        })
    }

    /// The JSON payload of a directives line, without the leading `//`.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// A complete directives line, ready to prefix a spec with.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("//{}\n", self.to_json())
    }
}
