//! CLI module containing the main entry point logic.
//!
//! Kept apart from main.rs so the argument handling can be tested without
//! spawning the binary.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser as ClapParser;
use tracing::debug;

use crate::candidate::Candidate;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::parser::{self, Directives};
use crate::registry::Registry;
use crate::{fatal_error, logging, shell};

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI arguments for the compspec tool.
#[derive(ClapParser, Debug)]
#[command(name = "compspec")]
#[command(version = PKG_VERSION)]
#[command(about = "Complete a command line against a completion spec", long_about = None)]
pub struct Cli {
    /// Spec file, or the name of a file in the spec directory
    #[arg(value_name = "SPEC_FILE")]
    spec_file: String,

    /// Command line words; the first is the command name
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present_any = ["list_commands", "check", "dump", "line"]
    )]
    words: Vec<String>,

    /// Whole command line to split into words instead of WORDS
    #[arg(long, value_name = "LINE", conflicts_with = "words")]
    line: Option<String>,

    /// Index of the word being completed (default: the last word)
    #[arg(long, value_name = "N")]
    cursor: Option<usize>,

    /// Output format for candidates
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: OutputFormatArg,

    /// List the commands the spec declares with @command
    #[arg(long)]
    list_commands: bool,

    /// Parse and validate the spec only
    #[arg(long)]
    check: bool,

    /// Print the parsed tree
    #[arg(long)]
    dump: bool,

    /// Tab width used for indentation (overrides the spec's directives)
    #[arg(long, value_name = "N")]
    tab_width: Option<usize>,

    /// Match candidates case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Don't treat '-' and '_' as equal when matching
    #[arg(long)]
    no_map_hyphen: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Output format for candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormatArg {
    /// One candidate per line (default)
    Text,
    /// A JSON array of candidate objects
    Json,
}

impl OutputFormatArg {
    /// Render candidates in this format
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_candidates(self, candidates: &[Candidate]) -> Result<String> {
        match self {
            Self::Text => Ok(candidates.iter().map(|c| format!("{c}\n")).collect()),
            Self::Json => Ok(format!("{}\n", serde_json::to_string_pretty(candidates)?)),
        }
    }
}

impl Cli {
    /// Apply command line overrides on top of environment settings.
    #[must_use]
    pub fn settings(&self, mut settings: Settings) -> Settings {
        if self.case_sensitive {
            settings.ignore_case = false;
        }
        if self.no_map_hyphen {
            settings.map_hyphen_underscore = false;
        }
        if self.debug {
            settings.debug = true;
        }
        if let Some(path) = &self.log_file {
            settings.log_file = Some(path.clone());
        }
        settings
    }

    fn raw_words(&self) -> Vec<String> {
        match &self.line {
            Some(line) => shell::split(line),
            None => self.words.clone(),
        }
    }
}

/// Run the parsed command and return what it prints.
///
/// # Errors
///
/// Returns an error if the spec can't be read or parsed, or completion
/// fails.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<String> {
    let path = settings.resolve_spec_path(&cli.spec_file);
    let registry = Registry::with_builtins();
    let ast = load_spec(&path, cli.tab_width, &registry)?;

    if cli.check {
        return Ok("ok\n".to_string());
    }
    if cli.dump {
        return Ok(ast.dump(ast.root(), true));
    }
    if cli.list_commands {
        return Ok(ast
            .target_commands()
            .iter()
            .map(|c| format!("{c}\n"))
            .collect());
    }

    let words = cli.raw_words();
    let cursor = cli.cursor.unwrap_or_else(|| words.len().saturating_sub(1));
    debug!(?words, cursor, "completing");
    let candidates = crate::complete(&ast, &registry, settings.match_config(), words, cursor)?;
    cli.format.format_candidates(&candidates)
}

fn load_spec(
    path: &Path,
    tab_width: Option<usize>,
    registry: &Registry,
) -> Result<crate::ast::Ast> {
    let spec = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut directives = Directives::extract(&spec)?;
    if directives.filename.is_empty() {
        directives = directives.with_filename(path.display().to_string());
    }
    if let Some(width) = tab_width {
        directives = directives.with_tab_width(width);
    }
    Ok(parser::parse(&spec, &directives, registry)?)
}

/// Main CLI logic.
pub fn run_cli() {
    let cli = Cli::parse();
    let settings = cli.settings(Settings::from_env());

    if let Err(e) = logging::init(&settings) {
        fatal_error(&format!("Error: {e}"));
    }

    match execute(&cli, &settings) {
        Ok(output) => print!("{output}"),
        Err(Error::Spec(e)) => fatal_error(&e.to_string()),
        Err(e) => fatal_error(&format!("Error: {e}")),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec_file(content: &str) -> (TempDir, String) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("svc.spec");
        fs::write(&path, content).unwrap();
        (tmp, path.display().to_string())
    }

    fn run(args: &[&str]) -> Result<String> {
        let argv = std::iter::once("compspec").chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        let settings = cli.settings(Settings::default());
        execute(&cli, &settings)
    }

    #[test]
    fn test_completes_last_word_by_default() {
        let (_tmp, path) = spec_file("@switch\n  start\n  stop\n  status # show\n");
        let out = run(&[path.as_str(), "svc", "st"]).unwrap();
        assert_eq!(out, "start\nstatus #\"show\"\nstop\n");
    }

    #[test]
    fn test_explicit_cursor_and_line() {
        let (_tmp, path) = spec_file("@switch\n  start\n  stop\n");
        let out = run(&["--cursor", "1", path.as_str(), "svc", "sto", "ignored"]).unwrap();
        assert_eq!(out, "stop\n");
        let out = run(&["--line", "svc ", path.as_str()]).unwrap();
        assert_eq!(out, "start\nstop\n");
    }

    #[test]
    fn test_json_output() {
        let (_tmp, path) = spec_file("start\n");
        let out = run(&["--format", "json", path.as_str(), "svc", ""]).unwrap();
        let parsed: Vec<Candidate> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, vec![Candidate::new("start")]);
    }

    #[test]
    fn test_check_dump_and_list() {
        let (_tmp, path) = spec_file("@command svc :svc\n@label :svc\n  start\n");
        assert_eq!(run(&["--check", path.as_str()]).unwrap(), "ok\n");
        assert_eq!(run(&["--list-commands", path.as_str()]).unwrap(), "svc\n");
        let dump = run(&["--dump", path.as_str()]).unwrap();
        assert!(dump.contains("Label: label=\"svc\""), "{dump}");
        assert!(dump.contains("  #3 [2] Literal: literal=\"start\""), "{dump}");
    }

    #[test]
    fn test_spec_error_names_file() {
        let (_tmp, path) = spec_file("@switch\n  @bogus\n");
        let err = run(&["--check", path.as_str()]).unwrap_err();
        let spec_err = err.as_spec_error().unwrap();
        assert_eq!(spec_err.file, path);
        assert_eq!(spec_err.line, 2);
    }

    #[test]
    fn test_missing_spec_file() {
        let err = run(&["--check", "/no/such/file.spec"]).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err}");
    }

    #[test]
    fn test_case_sensitive_flag() {
        let (_tmp, path) = spec_file("Start\n");
        assert_eq!(run(&[path.as_str(), "svc", "st"]).unwrap(), "Start\n");
        assert_eq!(run(&["--case-sensitive", path.as_str(), "svc", "st"]).unwrap(), "");
    }

    #[test]
    fn test_words_required_without_mode_flag() {
        assert!(Cli::try_parse_from(["compspec", "x.spec"]).is_err());
        assert!(Cli::try_parse_from(["compspec", "--check", "x.spec"]).is_ok());
    }
}
