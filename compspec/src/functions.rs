//! Built-in functions and helpers for building `@go_call` actions.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use regex::Regex;
use tracing::{debug, warn};

use crate::candidate::{Candidate, CandidateList};
use crate::interpreter::CompleteContext;
use crate::registry::{Callback, Registry, action, generator};

pub(crate) fn register_builtins(registry: &mut Registry) {
    let builtins: [(&str, Callback); 6] = [
        (
            "takeFile",
            generator(|_, args| take_file(args.first().map_or("", String::as_str))),
        ),
        ("takeDir", generator(|_, _| take_dir())),
        (
            "takeAny",
            generator(|_, args| take_any(args.first().map_or("", String::as_str))),
        ),
        ("takeInteger", generator(|_, _| take_integer())),
        (
            "takeLines",
            generator(|_, args| take_lines(args.first().map_or("", String::as_str))),
        ),
        (
            "takeCommandOutput",
            generator(|_, args| take_command_output(&args.join(" "))),
        ),
    ];
    for (name, f) in builtins {
        if let Err(e) = registry.register(name, f) {
            warn!("unable to register built-in {name}: {e}");
        }
    }
}

/// Files whose basename matches `pattern` (any file when empty), plus
/// directories, under the directory part of the typed prefix.
#[must_use]
pub fn take_file(pattern: &str) -> CandidateList {
    let regex = if pattern.is_empty() {
        None
    } else {
        match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("invalid file pattern {pattern:?}: {e}");
                return CandidateList::strict(Vec::new());
            }
        }
    };
    CandidateList::lazy(move |prefix| file_candidates(prefix, true, regex.as_ref()))
}

/// Directories under the directory part of the typed prefix.
#[must_use]
pub fn take_dir() -> CandidateList {
    CandidateList::lazy(|prefix| file_candidates(prefix, false, None))
}

/// Directories are always listed. Files are listed with `include_files`,
/// filtered by basename when a filter is given.
fn file_candidates(prefix: &str, include_files: bool, filter: Option<&Regex>) -> Vec<Candidate> {
    let dir = prefix.rfind('/').map_or("", |i| &prefix[..=i]);
    let read_from = if dir.is_empty() { "." } else { dir };
    debug!(prefix, dir, include_files, "file completion");

    let entries = match fs::read_dir(read_from) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("unable to read directory {read_from:?}: {e}");
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = format!("{dir}{name}");
        let path = Path::new(&rel);
        if path.is_dir() {
            candidates.push(Candidate::new(format!("{rel}/")).continues(!is_empty_dir(path)));
            continue;
        }
        if include_files && filter.is_none_or(|re| re.is_match(&name)) {
            candidates.push(Candidate::new(rel));
        }
    }
    candidates.sort_by(|a, b| a.value.cmp(&b.value));
    candidates
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).map_or(true, |mut entries| entries.next().is_none())
}

/// Accepts any word; offers a single placeholder carrying `help`.
#[must_use]
pub fn take_any(help: &str) -> CandidateList {
    CandidateList::open(vec![Candidate::any(help)])
}

/// Accepts any word and offers nothing.
#[must_use]
pub fn take_integer() -> CandidateList {
    CandidateList::open(Vec::new())
}

/// One candidate per line of `file`. Blank lines and `#` comments are
/// skipped. The file is read when candidates are requested.
#[must_use]
pub fn take_lines(file: &str) -> CandidateList {
    let file = file.to_string();
    CandidateList::lazy(move |_| match fs::read_to_string(&file) {
        Ok(content) => content
            .lines()
            .map(|line| line.trim_matches([' ', '\t', '\r']))
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(Candidate::new)
            .collect(),
        Err(e) => {
            debug!("unable to read {file:?}: {e}");
            Vec::new()
        }
    })
}

/// One candidate per non-empty output line of `command`, run with
/// `/bin/sh -c` when candidates are requested.
#[must_use]
pub fn take_command_output(command: &str) -> CandidateList {
    let command = command.to_string();
    CandidateList::lazy(move |_| {
        debug!(command = %command, "executing");
        let output = match Command::new("/bin/sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!("command execution error: command={command:?} error={e}");
                return Vec::new();
            }
        };
        if !output.status.success() {
            warn!("command execution error: command={command:?} status={}", output.status);
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(Candidate::new)
            .collect()
    })
}

/// An action storing `value` into `target`.
pub fn set_string(target: &Arc<Mutex<String>>, value: &str) -> Callback {
    let target = Arc::clone(target);
    let value = value.to_string();
    action(move |_, _| {
        debug!(value = %value, "set_string");
        *target.lock().unwrap_or_else(PoisonError::into_inner) = value.clone();
    })
}

/// An action storing `value` into `target`.
pub fn set_bool(target: &Arc<Mutex<bool>>, value: bool) -> Callback {
    let target = Arc::clone(target);
    action(move |_, _| {
        debug!(value, "set_bool");
        *target.lock().unwrap_or_else(PoisonError::into_inner) = value;
    })
}

/// An action storing the word before the pc, typically the flag that
/// introduced the current argument, into `target`.
pub fn set_last_seen_string(target: &Arc<Mutex<String>>) -> Callback {
    let target = Arc::clone(target);
    action(move |ctx: &dyn CompleteContext, _| {
        let word = ctx.word_at(-1);
        debug!(word = %word, "set_last_seen_string");
        *target.lock().unwrap_or_else(PoisonError::into_inner) = word;
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::interpreter::CommandLine;
    use crate::matcher::MatchConfig;
    use tempfile::TempDir;

    fn values(list: &CandidateList, prefix: &str) -> Vec<String> {
        list.candidates(prefix, &MatchConfig::default())
            .into_iter()
            .map(|c| c.value)
            .collect()
    }

    fn fixture() -> (TempDir, String) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::write(tmp.path().join("main.rs"), "").unwrap();
        fs::create_dir(tmp.path().join("full")).unwrap();
        fs::write(tmp.path().join("full").join("inner"), "").unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();
        let base = format!("{}/", tmp.path().display());
        (tmp, base)
    }

    #[test]
    fn test_take_file_lists_files_and_dirs() {
        let (_tmp, base) = fixture();
        let list = take_file("");
        assert_eq!(
            values(&list, &base),
            vec![
                format!("{base}empty/"),
                format!("{base}full/"),
                format!("{base}main.rs"),
                format!("{base}notes.txt"),
            ]
        );
        assert_eq!(values(&list, &format!("{base}n")), vec![format!("{base}notes.txt")]);
    }

    #[test]
    fn test_take_file_pattern_and_continues() {
        let (_tmp, base) = fixture();
        let got = take_file(r"\.rs$").candidates(&base, &MatchConfig::default());
        let rendered: Vec<_> = got.iter().map(|c| (c.value.clone(), c.continues)).collect();
        assert_eq!(
            rendered,
            vec![
                (format!("{base}empty/"), false),
                (format!("{base}full/"), true),
                (format!("{base}main.rs"), false),
            ]
        );
    }

    #[test]
    fn test_take_dir_skips_files() {
        let (_tmp, base) = fixture();
        assert_eq!(
            values(&take_dir(), &base),
            vec![format!("{base}empty/"), format!("{base}full/")]
        );
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        assert!(values(&take_dir(), "/definitely/not/here/").is_empty());
    }

    #[test]
    fn test_take_lines_skips_comments() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("devices");
        fs::write(&file, "# serials\nemulator-5554\n\n  HT1234 \r\n").unwrap();
        let list = take_lines(&file.display().to_string());
        assert_eq!(values(&list, ""), vec!["emulator-5554", "HT1234"]);
        assert!(values(&take_lines("/no/such/file"), "").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_take_command_output() {
        let list = take_command_output("printf 'alpha\\n\\nbeta\\n'");
        assert_eq!(values(&list, ""), vec!["alpha", "beta"]);
        assert!(values(&take_command_output("exit 3"), "").is_empty());
    }

    #[test]
    fn test_take_any_and_integer_accept_anything() {
        let cfg = MatchConfig::default();
        assert!(take_any("<ID>").matches_fully("x", &cfg));
        assert_eq!(take_any("<ID>").candidates("", &cfg), vec![Candidate::any("<ID>")]);
        assert!(take_integer().matches_fully("42", &cfg));
        assert!(take_integer().candidates("", &cfg).is_empty());
    }

    #[test]
    fn test_setters() {
        let mut line = CommandLine::new(vec!["cmd".into(), "-s".into(), "serial".into()], 2);
        line.set_pc(2);
        let ctx: &dyn CompleteContext = &line;
        let no_args: &[String] = &[];

        let s = Arc::new(Mutex::new(String::new()));
        set_string(&s, "value")(ctx, no_args);
        assert_eq!(*s.lock().unwrap(), "value");

        set_last_seen_string(&s)(ctx, no_args);
        assert_eq!(*s.lock().unwrap(), "-s");

        let b = Arc::new(Mutex::new(false));
        assert!(set_bool(&b, true)(ctx, no_args).is_none());
        assert!(*b.lock().unwrap());
    }
}
