//! # compspec
//!
//! A shell completion engine driven by a small indentation-based spec
//! language. A spec describes the words a command accepts; the engine
//! walks it against a partially typed command line and returns the
//! candidates for the word under the cursor.
//!
//! ```text
//! @switch
//!   start|stop|restart # lifecycle action
//!     @cand takeFile "\.conf$"
//!   status
//! ```

pub mod ast;
pub mod candidate;
pub mod cli;
pub mod config;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod logging;
pub mod matcher;
pub mod parser;
pub mod registry;
pub mod shell;

pub use candidate::{Candidate, CandidateList};
pub use error::{Error, Result, SpecError};
pub use interpreter::{CommandLine, CompleteContext, Interpreter};
pub use matcher::MatchConfig;
pub use registry::Registry;

/// Complete `raw_words` with the cursor on word `cursor_index`.
///
/// # Errors
///
/// See [`Interpreter::run`].
pub fn complete(
    ast: &ast::Ast,
    registry: &Registry,
    config: MatchConfig,
    raw_words: Vec<String>,
    cursor_index: usize,
) -> Result<Vec<Candidate>> {
    let command_line = CommandLine::new(raw_words, cursor_index);
    Interpreter::new(ast, registry, config, command_line).run()
}

/// Print an error message and exit with code 1.
pub fn fatal_error(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
