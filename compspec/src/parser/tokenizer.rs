//! Tokenizer for the completion spec language.
//!
//! Tokens are runs of non-whitespace characters. The first character decides
//! the kind: `@` starts a directive, `:` a label and `#` a help string that
//! extends to the end of the line. `"..."` and `` `...` `` are literal strings
//! and bypass that special-casing. `//` and `/* */` comments are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::directives::Directives;
use super::error::SpecError;
use crate::ast::{Token, TokenKind};

const MISPLACED_SIGIL: &str =
    "@ and : can only show up as the first character (consider quoting with \"...\")";

/// Joins a help string continued onto the next line with `\`.
#[allow(clippy::expect_used)]
static HELP_CONTINUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\n\s*#\s*").expect("help continuation pattern is valid"));

/// Expand tabs to stops every `width` columns. Columns restart on each line.
#[must_use]
pub fn expand_tabs(source: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(source.len());
    let mut column = 0;
    for ch in source.chars() {
        match ch {
            '\t' => {
                let n = width - column % width;
                out.extend(std::iter::repeat_n(' ', n));
                column += n;
            }
            '\n' => {
                out.push('\n');
                column = 0;
            }
            _ => {
                out.push(ch);
                column += 1;
            }
        }
    }
    out
}

/// Splits a spec into [`Token`]s, with one token of push-back.
pub struct Tokenizer {
    source: String,
    chars: Vec<char>,
    pos: usize,
    /// 1-based line and column of `chars[pos]`.
    line: usize,
    column: usize,

    filename: String,
    start_line: usize,

    current: Option<Token>,
    last: Option<Token>,
    peek: Option<Token>,

    last_line_no: usize,
    index_in_line: usize,
}

impl Tokenizer {
    #[must_use]
    pub fn new(source: &str, directives: &Directives) -> Self {
        let source = expand_tabs(source, directives.tab_width);
        let chars = source.chars().collect();
        Tokenizer {
            source,
            chars,
            pos: 0,
            line: 1,
            column: 1,
            filename: directives.filename.clone(),
            start_line: directives.start_line,
            current: None,
            last: None,
            peek: None,
            last_line_no: 0,
            index_in_line: 0,
        }
    }

    /// The tab-expanded source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The most recently returned token.
    #[must_use]
    pub fn current_token(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Return `token` from the next call to [`Tokenizer::next_token`].
    ///
    /// # Panics
    ///
    /// Panics if a token is already pushed back. Only the parser calls this,
    /// so a second push-back is a parser defect.
    pub fn push_back(&mut self, token: Token) {
        assert!(self.peek.is_none(), "push_back called twice");
        self.peek = Some(token);
        self.current = self.last.take();
    }

    /// The next token, or `None` at the end of the input.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] for malformed input: an unterminated
    /// string or comment, a bad escape, or a misplaced `@`/`:`.
    pub fn next_token(&mut self) -> Result<Option<Token>, SpecError> {
        if let Some(token) = self.peek.take() {
            self.last = self.current.replace(token.clone());
            return Ok(Some(token));
        }

        let Some((raw, line, column)) = self.scan()? else {
            return Ok(None);
        };
        let (kind, word) = self.classify(&raw, line, column)?;

        if self.last_line_no == line {
            self.index_in_line += 1;
        } else {
            self.index_in_line = 0;
        }
        self.last_line_no = line;

        let token = Token {
            kind,
            word,
            raw_word: raw,
            source_file: self.filename.clone(),
            line: self.report_line(line),
            column,
            index_in_line: self.index_in_line,
        };
        trace!(
            line = token.line,
            column = token.column,
            kind = token.kind.name(),
            raw = %token.raw_word,
            "token"
        );
        self.last = self.current.replace(token.clone());
        Ok(Some(token))
    }

    /// The next token if it's on the same line as the current one. A token
    /// on a later line is pushed back.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Tokenizer::next_token`].
    pub fn next_token_in_line(&mut self) -> Result<Option<Token>, SpecError> {
        let line = self.current.as_ref().map(|t| t.line);
        let Some(token) = self.next_token()? else {
            return Ok(None);
        };
        if Some(token.line) == line {
            return Ok(Some(token));
        }
        self.push_back(token);
        Ok(None)
    }

    /// The next same-line token, which must be of kind `expected`
    /// ([`TokenKind::Any`] accepts every kind).
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] carrying `message` when the line ends or the
    /// token has another kind.
    pub fn must_next_token_in_line(
        &mut self,
        expected: TokenKind,
        message: &str,
    ) -> Result<Token, SpecError> {
        match self.next_token_in_line()? {
            None => Err(self.error_at_current(message)),
            Some(token) if expected != TokenKind::Any && token.kind != expected => {
                Err(SpecError::at(&token, message))
            }
            Some(token) => Ok(token),
        }
    }

    /// Literal and help tokens up to the end of the line. A help token ends
    /// the arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] at the first label or directive token.
    pub fn maybe_args_and_help(&mut self) -> Result<(Vec<Token>, Option<Token>), SpecError> {
        let mut args = Vec::new();
        while let Some(token) = self.next_token_in_line()? {
            match token.kind {
                TokenKind::Literal => args.push(token),
                TokenKind::Help => return Ok((args, Some(token))),
                _ => {
                    return Err(SpecError::at(
                        &token,
                        "Only string literals or a help string (#...) may appear here",
                    ));
                }
            }
        }
        Ok((args, None))
    }

    /// An optional trailing help string.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] if another kind of token follows.
    pub fn maybe_help(&mut self) -> Result<Option<Token>, SpecError> {
        match self.next_token_in_line()? {
            Some(token) if token.kind != TokenKind::Help => Err(SpecError::at(
                &token,
                "Only a help string (#...) may appear here",
            )),
            other => Ok(other),
        }
    }

    /// An optional trailing label.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] if another kind of token follows.
    pub fn maybe_label(&mut self) -> Result<Option<Token>, SpecError> {
        match self.next_token_in_line()? {
            Some(token) if token.kind != TokenKind::Label => Err(SpecError::at(
                &token,
                "Only a label (:...) may appear here",
            )),
            other => Ok(other),
        }
    }

    /// An optional literal followed by an optional label, ending the line.
    /// A trailing help string is accepted and dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] for any other token layout.
    pub fn maybe_literal_and_label(
        &mut self,
    ) -> Result<(Option<Token>, Option<Token>), SpecError> {
        let Some(token) = self.next_token_in_line()? else {
            return Ok((None, None));
        };
        match token.kind {
            TokenKind::Label => {
                self.must_have_no_token_in_line()?;
                Ok((None, Some(token)))
            }
            TokenKind::Literal => {
                let label = self.maybe_label()?;
                self.must_have_no_token_in_line()?;
                Ok((Some(token), label))
            }
            TokenKind::Help => Ok((None, None)),
            _ => Err(SpecError::at(
                &token,
                "Only a pattern or a label (:...) may appear here",
            )),
        }
    }

    /// Fail if anything else follows on the current line.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] at the excess token.
    pub fn must_have_no_token_in_line(&mut self) -> Result<(), SpecError> {
        match self.next_token_in_line()? {
            Some(token) => Err(SpecError::at(&token, "excessive token detected")),
            None => Ok(()),
        }
    }

    fn report_line(&self, line: usize) -> usize {
        (line + self.start_line).saturating_sub(1)
    }

    fn error_at(&self, line: usize, column: usize, message: impl Into<String>) -> SpecError {
        SpecError::at_location(&self.filename, self.report_line(line), column, message)
    }

    fn error_at_current(&self, message: &str) -> SpecError {
        match &self.current {
            Some(token) => SpecError::at(token, message),
            None => self.error_at(self.line, self.column, message),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Raw text of the next token with its (unadjusted) line and column.
    fn scan(&mut self) -> Result<Option<(String, usize, usize)>, SpecError> {
        loop {
            while self.peek_char().is_some_and(char::is_whitespace) {
                self.bump();
            }
            let Some(ch) = self.peek_char() else {
                return Ok(None);
            };
            let (line, column) = (self.line, self.column);

            match (ch, self.peek_nth(1)) {
                ('/', Some('/')) => {
                    while self.peek_char().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                ('/', Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            None => {
                                return Err(self.error_at(line, column, "comment not terminated"));
                            }
                            Some('*') if self.peek_char() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                        }
                    }
                }
                ('"', _) => return self.scan_quoted(line, column).map(Some),
                ('`', _) => return self.scan_backquoted(line, column).map(Some),
                ('#', _) => return Ok(Some((self.scan_help(), line, column))),
                _ => return self.scan_word(line, column).map(Some),
            }
        }
    }

    fn scan_quoted(
        &mut self,
        line: usize,
        column: usize,
    ) -> Result<(String, usize, usize), SpecError> {
        let mut raw = String::new();
        raw.extend(self.bump());
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(self.error_at(line, column, format!("invalid string {raw}")));
                }
                Some('"') => {
                    raw.extend(self.bump());
                    return Ok((raw, line, column));
                }
                Some('\\') => {
                    raw.extend(self.bump());
                    if let Some(c) = self.peek_char()
                        && c != '\n'
                    {
                        raw.extend(self.bump());
                    }
                }
                Some(_) => raw.extend(self.bump()),
            }
        }
    }

    fn scan_backquoted(
        &mut self,
        line: usize,
        column: usize,
    ) -> Result<(String, usize, usize), SpecError> {
        let mut raw = String::new();
        raw.extend(self.bump());
        loop {
            match self.bump() {
                None => return Err(self.error_at(line, column, format!("invalid string {raw}"))),
                Some('`') => {
                    raw.push('`');
                    return Ok((raw, line, column));
                }
                Some(c) => raw.push(c),
            }
        }
    }

    fn scan_help(&mut self) -> String {
        let mut raw = String::new();
        let mut prev = '\0';
        while let Some(c) = self.peek_char() {
            if c == '\n' && prev != '\\' {
                break;
            }
            raw.push(c);
            prev = c;
            self.bump();
        }
        raw
    }

    fn scan_word(
        &mut self,
        line: usize,
        column: usize,
    ) -> Result<(String, usize, usize), SpecError> {
        let mut raw = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                break;
            }
            if !raw.is_empty() && (c == '@' || c == ':') {
                return Err(self.error_at(self.line, self.column, MISPLACED_SIGIL));
            }
            raw.push(c);
            self.bump();
        }
        Ok((raw, line, column))
    }

    fn classify(
        &self,
        raw: &str,
        line: usize,
        column: usize,
    ) -> Result<(TokenKind, String), SpecError> {
        let mut chars = raw.chars();
        let first = chars.next().unwrap_or_default();
        let rest = chars.as_str();
        match first {
            '@' if rest.is_empty() => Err(self.error_at(
                line,
                column,
                "missing function or command name after @",
            )),
            '@' => Ok((TokenKind::Command, rest.to_string())),
            ':' if rest.is_empty() => {
                Err(self.error_at(line, column, "missing label name after :"))
            }
            ':' => Ok((TokenKind::Label, rest.to_string())),
            '#' => {
                let trimmed = rest.trim_matches([' ', '\t', '\r', '\n']);
                let word = HELP_CONTINUATION.replace_all(trimmed, "");
                Ok((TokenKind::Help, word.into_owned()))
            }
            '"' => unquote(&raw[1..raw.len() - 1])
                .map(|word| (TokenKind::Literal, word))
                .ok_or_else(|| self.error_at(line, column, format!("invalid string {raw}"))),
            '`' => Ok((TokenKind::Literal, raw[1..raw.len() - 1].to_string())),
            _ => Ok((TokenKind::Literal, raw.to_string())),
        }
    }
}

/// Resolve backslash escapes in the body of a double-quoted string.
/// Returns `None` on an invalid escape.
fn unquote(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            c @ ('\\' | '"' | '\'') => c,
            'x' => hex_escape(&mut chars, 2)?,
            'u' => hex_escape(&mut chars, 4)?,
            'U' => hex_escape(&mut chars, 8)?,
            c @ '0'..='7' => {
                let mut value = c.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                if value > 0xff {
                    return None;
                }
                char::from_u32(value)?
            }
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

fn hex_escape(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}
