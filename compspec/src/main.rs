//! # compspec
//!
//! Complete a command line against a completion spec.
//!
//! ## Usage
//!
//! - Complete the last word: `compspec git.spec git chec`
//! - Complete a given word: `compspec --cursor 1 git.spec git chec origin`
//! - Split a whole line: `compspec --line "git checkout " git.spec`
//! - Validate a spec: `compspec --check git.spec`
//!
//! Named spec files are looked up in `$COMPSPEC_DIR/spec` (default
//! `~/.compspec/spec`).

/// Entry point for the CLI tool.
fn main() {
    compspec::cli::run_cli();
}
