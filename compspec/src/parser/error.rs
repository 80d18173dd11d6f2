//! Spec error type and formatting.
//!
//! Every problem caused by malformed spec text is reported as a [`SpecError`]
//! carrying the source location of the offending token, so it can be rendered
//! with the source line and a caret underneath.

use std::fmt;

use crate::ast::Token;

/// A structured error caused by malformed spec input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecError {
    /// Human-readable error message.
    pub message: String,
    /// Source file name, empty when unknown.
    pub file: String,
    /// Line number (1-indexed, already offset by the directives' start line).
    /// Zero when the error has no location.
    pub line: usize,
    /// Column number (1-indexed, after tab expansion). Zero when unknown.
    pub column: usize,
    /// The full text of the offending source line, when available.
    pub source_line: Option<String>,
}

impl SpecError {
    /// Create an error without a source location.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        SpecError {
            message: message.into(),
            file: String::new(),
            line: 0,
            column: 0,
            source_line: None,
        }
    }

    /// Create an error pointing at a token.
    #[must_use]
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        SpecError {
            message: message.into(),
            file: token.source_file.clone(),
            line: token.line,
            column: token.column,
            source_line: None,
        }
    }

    /// Create an error pointing at an explicit location.
    #[must_use]
    pub fn at_location(
        file: &str,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        SpecError {
            message: message.into(),
            file: file.to_string(),
            line,
            column,
            source_line: None,
        }
    }

    /// Whether this error carries a line/column location.
    #[must_use]
    pub fn has_location(&self) -> bool {
        self.line > 0 || self.column > 0
    }

    /// Attach the offending source line, looked up from the (tab-expanded)
    /// spec text. `start_line` is the line number the text begins at.
    #[must_use]
    pub fn with_source(mut self, source: &str, start_line: usize) -> Self {
        if self.source_line.is_none() && self.line >= start_line && self.has_location() {
            self.source_line = source
                .lines()
                .nth(self.line - start_line)
                .map(str::to_string);
        }
        self
    }
}

/// Format the caret underline for an error at `column`.
fn underline(column: usize) -> String {
    format!("{}^", " ".repeat(column.saturating_sub(1)))
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: invalid spec: {}", self.message)?;
        if !self.has_location() {
            return Ok(());
        }
        writeln!(f)?;

        let location = if self.file.is_empty() {
            format!("{}:{}", self.line, self.column)
        } else {
            format!("{}:{}:{}", self.file, self.line, self.column)
        };
        write!(f, "  --> {location}")?;

        if let Some(ref src) = self.source_line {
            let num = self.line.to_string();
            let pad = " ".repeat(num.len());

            writeln!(f)?;
            writeln!(f, "   {pad} |")?;
            writeln!(f, "   {num} | {src}")?;
            write!(f, "   {pad} | {}", underline(self.column))?;
        }
        Ok(())
    }
}

impl std::error::Error for SpecError {}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ast::TokenKind;

    fn token(line: usize, column: usize) -> Token {
        Token {
            kind: TokenKind::Literal,
            word: "foo".to_string(),
            raw_word: "foo".to_string(),
            source_file: "spec.txt".to_string(),
            line,
            column,
            index_in_line: 0,
        }
    }

    #[test]
    fn test_display_without_location() {
        let err = SpecError::new("something broke");
        assert_eq!(err.to_string(), "error: invalid spec: something broke");
    }

    #[test]
    fn test_display_includes_file_and_location() {
        let err = SpecError::at(&token(3, 5), "bad token");
        let rendered = err.to_string();
        assert!(rendered.contains("invalid spec: bad token"), "{rendered}");
        assert!(rendered.contains("--> spec.txt:3:5"), "{rendered}");
    }

    #[test]
    fn test_source_line_and_caret() {
        let source = "@switch\n\tstart\n    bad:token\n";
        let err = SpecError::at(&token(3, 8), "oops").with_source(source, 1);
        assert_eq!(err.source_line.as_deref(), Some("    bad:token"));
        let rendered = err.to_string();
        assert!(rendered.contains("3 |     bad:token"), "{rendered}");
        assert!(rendered.ends_with("|        ^"), "{rendered}");
    }

    #[test]
    fn test_with_source_respects_start_line() {
        let source = "first\nsecond\n";
        let err = SpecError::at(&token(11, 1), "x").with_source(source, 10);
        assert_eq!(err.source_line.as_deref(), Some("second"));
    }

    #[test]
    fn test_with_source_ignores_unlocated_errors() {
        let err = SpecError::new("x").with_source("line", 1);
        assert!(err.source_line.is_none());
    }
}
