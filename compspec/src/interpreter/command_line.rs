//! The command line being completed.

use crate::shell;

/// Read-only view of the completion request, handed to registered
/// functions.
///
/// Offsets are relative: `word_at(-1)` is the word before the one the
/// engine is looking at, `word_at_cursor(0)` is the word being typed.
pub trait CompleteContext {
    /// The unescaped command name (word 0).
    fn command(&self) -> String;
    /// The command name as typed.
    fn raw_command(&self) -> String;
    /// The unescaped word at `cursor + offset`.
    fn word_at_cursor(&self, offset: isize) -> String;
    /// The word at `cursor + offset` as typed.
    fn raw_word_at_cursor(&self, offset: isize) -> String;
    /// The unescaped word at `pc + offset`.
    fn word_at(&self, offset: isize) -> String;
    /// The word at `pc + offset` as typed.
    fn raw_word_at(&self, offset: isize) -> String;
    fn before_cursor(&self) -> bool;
    fn at_cursor(&self) -> bool;
    fn after_cursor(&self) -> bool;
}

/// Words of the command line, the cursor position and the program counter
/// (`pc`) the interpreter advances as it matches words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    raw_words: Vec<String>,
    words: Vec<String>,
    cursor_index: usize,
    pc: usize,
}

impl CommandLine {
    /// Words are unescaped with [`shell::unescape`].
    #[must_use]
    pub fn new(raw_words: Vec<String>, cursor_index: usize) -> Self {
        let words = raw_words.iter().map(|w| shell::unescape(w)).collect();
        CommandLine {
            raw_words,
            words,
            cursor_index,
            pc: 0,
        }
    }

    #[must_use]
    pub fn cursor_index(&self) -> usize {
        self.cursor_index
    }

    #[must_use]
    pub fn raw_words(&self) -> &[String] {
        &self.raw_words
    }

    #[must_use]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Set the program counter, clamped to `0..=word_len() + 1`.
    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc.min(self.word_len() + 1);
    }

    pub fn advance_pc(&mut self, n: usize) {
        self.pc += n;
    }

    /// Number of words up to and including the cursor word.
    #[must_use]
    pub fn word_len(&self) -> usize {
        self.cursor_index + 1
    }

    /// The unescaped word at `index`, or `""` when out of range or when the
    /// pc has moved past the cursor.
    #[must_use]
    pub fn word_at_index(&self, index: isize) -> &str {
        self.lookup(&self.words, index)
    }

    /// The word at `index` as typed. Same bounds rules as
    /// [`CommandLine::word_at_index`].
    #[must_use]
    pub fn raw_word_at_index(&self, index: isize) -> &str {
        self.lookup(&self.raw_words, index)
    }

    fn lookup<'a>(&self, words: &'a [String], index: isize) -> &'a str {
        if self.is_after_cursor() {
            return "";
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| words.get(i))
            .map_or("", String::as_str)
    }

    fn offset(base: usize, offset: isize) -> isize {
        isize::try_from(base).unwrap_or(isize::MAX).saturating_add(offset)
    }

    /// The unescaped word under the cursor, shifted by `offset`.
    #[must_use]
    pub fn cursor_word(&self, offset: isize) -> &str {
        self.word_at_index(Self::offset(self.cursor_index, offset))
    }

    /// The unescaped word at the pc, shifted by `offset`.
    #[must_use]
    pub fn current_word(&self, offset: isize) -> &str {
        self.word_at_index(Self::offset(self.pc, offset))
    }

    #[must_use]
    pub fn raw_current_word(&self, offset: isize) -> &str {
        self.raw_word_at_index(Self::offset(self.pc, offset))
    }

    #[must_use]
    pub fn is_before_cursor(&self) -> bool {
        self.pc < self.cursor_index
    }

    /// Collecting mode: the pc is on the word being typed.
    #[must_use]
    pub fn is_at_cursor(&self) -> bool {
        self.pc == self.cursor_index
    }

    #[must_use]
    pub fn is_after_cursor(&self) -> bool {
        self.pc > self.cursor_index
    }
}

impl CompleteContext for CommandLine {
    fn command(&self) -> String {
        self.word_at_index(0).to_string()
    }

    fn raw_command(&self) -> String {
        self.raw_word_at_index(0).to_string()
    }

    fn word_at_cursor(&self, offset: isize) -> String {
        self.cursor_word(offset).to_string()
    }

    fn raw_word_at_cursor(&self, offset: isize) -> String {
        self.raw_word_at_index(Self::offset(self.cursor_index, offset))
            .to_string()
    }

    fn word_at(&self, offset: isize) -> String {
        self.current_word(offset).to_string()
    }

    fn raw_word_at(&self, offset: isize) -> String {
        self.raw_current_word(offset).to_string()
    }

    fn before_cursor(&self) -> bool {
        self.is_before_cursor()
    }

    fn at_cursor(&self) -> bool {
        self.is_at_cursor()
    }

    fn after_cursor(&self) -> bool {
        self.is_after_cursor()
    }
}
