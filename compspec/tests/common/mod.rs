//! Common test helpers shared across integration tests

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)] // Not all helpers are used by every test file

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use compspec::ast::Ast;
use compspec::functions::{set_last_seen_string, set_string};
use compspec::parser::{self, Directives};
use compspec::registry::generator;
use compspec::{Candidate, CandidateList, MatchConfig, Registry, Result, shell};

/// Package version for testing --version flag
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Path of the compiled binary
pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_compspec"))
}

/// Helper to create a Command with test environment.
/// Points `COMPSPEC_DIR` at `home` so the user's specs are never used.
pub fn test_command(home: &Path) -> Command {
    let mut cmd = Command::new(get_binary_path());
    cmd.env("COMPSPEC_DIR", home);
    for var in ["COMPSPEC_LOG", "RUST_LOG", "COMPSPEC_LOG_FILE", "COMPSPEC_DEBUG"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a temporary directory for tests
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Write a spec file named `name` into `dir`
pub fn create_spec(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Registry with the built-ins plus the helpers the case files use:
/// `takeLazily`/`takeStatically` offer their arguments, `setA`/`setB`/
/// `setCurrent` write a shared holder that `takeHeldValue` offers.
pub fn test_registry() -> Registry {
    let holder = Arc::new(Mutex::new(String::new()));
    let mut r = Registry::with_builtins();

    r.register(
        "takeLazily",
        generator(|_, args| {
            let args = args.to_vec();
            CandidateList::lazy(move |_| args.iter().map(Candidate::new).collect())
        }),
    )
    .unwrap();
    r.register(
        "takeStatically",
        generator(|_, args| CandidateList::strict(args.iter().map(Candidate::new).collect())),
    )
    .unwrap();
    r.register("setA", set_string(&holder, "A")).unwrap();
    r.register("setB", set_string(&holder, "B")).unwrap();
    r.register("setCurrent", set_last_seen_string(&holder)).unwrap();

    let held = Arc::clone(&holder);
    r.register(
        "takeHeldValue",
        generator(move |_, _| {
            let value = held.lock().unwrap().clone();
            CandidateList::strict(vec![Candidate::new(value)])
        }),
    )
    .unwrap();
    r
}

pub fn parse(spec: &str, registry: &Registry) -> Ast {
    parser::parse_spec(spec, registry).unwrap_or_else(|e| panic!("{e}"))
}

/// Complete `line` (split like a shell would) with the cursor on its last
/// word.
pub fn complete_line(spec: &str, registry: &Registry, line: &str) -> Result<Vec<Candidate>> {
    let directives = Directives::default().with_filename("test.spec");
    let ast = parser::parse(spec, &directives, registry)?;
    let words = shell::split(line);
    let cursor = words.len().saturating_sub(1);
    compspec::complete(&ast, registry, MatchConfig::default(), words, cursor)
}

/// Candidates rendered one per line, as the CLI prints them.
pub fn render(candidates: &[Candidate]) -> String {
    candidates.iter().map(|c| format!("{c}\n")).collect()
}
