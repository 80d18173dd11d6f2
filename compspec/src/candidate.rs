//! Completion candidates and candidate lists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::MatchConfig;

/// A single completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Text to insert, e.g. `-f`, `--file`, `filename.txt`.
    pub value: String,
    /// Insert as-is without shell escaping (e.g. `$HOME`).
    #[serde(default)]
    pub raw: bool,
    /// Only offered when explicitly requested by the shell adapter.
    #[serde(default)]
    pub hidden: bool,
    /// Do not append a space after insertion (e.g. directories).
    #[serde(default)]
    pub continues: bool,
    /// Always considered a match regardless of the typed prefix.
    #[serde(default)]
    pub force: bool,
    /// Help text shown next to the candidate.
    #[serde(default)]
    pub help: String,
    /// Whether the help text should be shown.
    #[serde(default = "default_needs_help")]
    pub needs_help: bool,
}

fn default_needs_help() -> bool {
    true
}

impl Candidate {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Candidate {
            value: value.into(),
            raw: false,
            hidden: false,
            continues: false,
            force: false,
            help: String::new(),
            needs_help: true,
        }
    }

    /// A forced placeholder candidate with no value, used for open-ended
    /// arguments like `<INTEGER>`.
    #[must_use]
    pub fn any(help: impl Into<String>) -> Self {
        Candidate::new("").force(true).help(help)
    }

    #[must_use]
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub fn continues(mut self, continues: bool) -> Self {
        self.continues = continues;
        self
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    #[must_use]
    pub fn needs_help(mut self, needs_help: bool) -> Self {
        self.needs_help = needs_help;
        self
    }

    /// Whether this candidate should be offered for the typed `prefix`.
    #[must_use]
    pub fn matches(&self, prefix: &str, cfg: &MatchConfig) -> bool {
        self.force || cfg.string_matches(&self.value, prefix)
    }

    /// Whether a fully typed `word` selects this candidate.
    #[must_use]
    pub fn matches_fully(&self, word: &str, cfg: &MatchConfig) -> bool {
        self.force || cfg.string_equals(&self.value, word)
    }
}

/// Renders the line format used by the tester output:
/// `#` hidden, `!` force, `~` raw, then the value, `+` when it continues,
/// and the quoted help text.
impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hidden {
            f.write_str("#")?;
        }
        if self.force {
            f.write_str("!")?;
        }
        if self.raw {
            f.write_str("~")?;
        }
        f.write_str(&self.value)?;
        if self.continues {
            f.write_str("+")?;
        }
        if !self.help.is_empty() {
            write!(f, " #{:?}", self.help)?;
        }
        Ok(())
    }
}

type Generator = Box<dyn Fn(&str) -> Vec<Candidate>>;

/// A set of candidates produced by a spec node or a registered function.
pub enum CandidateList {
    /// A fixed set. A strict list is exhaustive: no word outside it is
    /// accepted. An open list accepts any word.
    Static {
        candidates: Vec<Candidate>,
        strict: bool,
    },
    /// Candidates generated on demand from the typed prefix. Accepts any
    /// non-empty word.
    Lazy(Generator),
}

impl CandidateList {
    /// An exhaustive list.
    #[must_use]
    pub fn strict(candidates: Vec<Candidate>) -> Self {
        CandidateList::Static {
            candidates,
            strict: true,
        }
    }

    /// A non-exhaustive list; any word is a potential match.
    #[must_use]
    pub fn open(candidates: Vec<Candidate>) -> Self {
        CandidateList::Static {
            candidates,
            strict: false,
        }
    }

    /// A list generated lazily from the typed prefix.
    #[must_use]
    pub fn lazy(generator: impl Fn(&str) -> Vec<Candidate> + 'static) -> Self {
        CandidateList::Lazy(Box::new(generator))
    }

    /// Candidates matching `prefix`.
    #[must_use]
    pub fn candidates(&self, prefix: &str, cfg: &MatchConfig) -> Vec<Candidate> {
        match self {
            CandidateList::Static { candidates, .. } => candidates
                .iter()
                .filter(|c| c.matches(prefix, cfg))
                .cloned()
                .collect(),
            CandidateList::Lazy(generator) => generator(prefix)
                .into_iter()
                .filter(|c| c.matches(prefix, cfg))
                .collect(),
        }
    }

    /// Whether any enumerated candidate fully matches `word`.
    #[must_use]
    pub fn contains_match(&self, word: &str, cfg: &MatchConfig) -> bool {
        match self {
            CandidateList::Static { candidates, .. } => {
                candidates.iter().any(|c| c.matches_fully(word, cfg))
            }
            CandidateList::Lazy(generator) => generator(word)
                .iter()
                .any(|c| c.matches_fully(word, cfg)),
        }
    }

    /// Whether the fully typed `word` is accepted by this list.
    #[must_use]
    pub fn matches_fully(&self, word: &str, cfg: &MatchConfig) -> bool {
        match self {
            CandidateList::Static { strict: true, .. } => self.contains_match(word, cfg),
            CandidateList::Static { strict: false, .. } => true,
            CandidateList::Lazy(_) => !word.is_empty(),
        }
    }

    /// Fill in `help` on every candidate that has none.
    #[must_use]
    pub fn with_default_help(self, help: &str) -> Self {
        if help.is_empty() {
            return self;
        }
        let help = help.to_string();
        match self {
            CandidateList::Static { candidates, strict } => CandidateList::Static {
                candidates: candidates
                    .into_iter()
                    .map(|c| fill_help(c, &help))
                    .collect(),
                strict,
            },
            CandidateList::Lazy(generator) => CandidateList::lazy(move |prefix| {
                generator(prefix)
                    .into_iter()
                    .map(|c| fill_help(c, &help))
                    .collect()
            }),
        }
    }
}

fn fill_help(c: Candidate, help: &str) -> Candidate {
    if c.help.is_empty() { c.help(help) } else { c }
}

impl fmt::Debug for CandidateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateList::Static { candidates, strict } => f
                .debug_struct("Static")
                .field("candidates", candidates)
                .field("strict", strict)
                .finish(),
            CandidateList::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}
