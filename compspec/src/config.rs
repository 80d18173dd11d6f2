//! Environment settings and spec file discovery.

use std::env;
use std::path::{Path, PathBuf};

use crate::matcher::MatchConfig;

/// Directory under [`Settings::home`] holding spec files.
pub const SPEC_SUBDIR: &str = "spec";

/// Settings read from `COMPSPEC_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `COMPSPEC_IGNORE_CASE`
    pub ignore_case: bool,
    /// `COMPSPEC_MAP_CASE`: treat `-` and `_` alike.
    pub map_hyphen_underscore: bool,
    /// `COMPSPEC_DEBUG`
    pub debug: bool,
    /// `COMPSPEC_LOG_FILE`
    pub log_file: Option<PathBuf>,
    /// `COMPSPEC_DIR`, defaulting to `~/.compspec`.
    pub home: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ignore_case: true,
            map_hyphen_underscore: true,
            debug: false,
            log_file: None,
            home: get_home_dir().map(|h| h.join(".compspec")),
        }
    }
}

impl Settings {
    /// Read settings from the environment. Unset or unparsable values keep
    /// their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ignore_case: env_bool("COMPSPEC_IGNORE_CASE", defaults.ignore_case),
            map_hyphen_underscore: env_bool("COMPSPEC_MAP_CASE", defaults.map_hyphen_underscore),
            debug: env_bool("COMPSPEC_DEBUG", defaults.debug),
            log_file: env::var_os("COMPSPEC_LOG_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            home: env::var_os("COMPSPEC_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or(defaults.home),
        }
    }

    #[must_use]
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            ignore_case: self.ignore_case,
            map_hyphen_underscore: self.map_hyphen_underscore,
        }
    }

    /// Where named spec files are looked up.
    #[must_use]
    pub fn spec_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join(SPEC_SUBDIR))
    }

    /// Resolve a spec argument: an existing path is used as is, anything
    /// else is looked up in [`Settings::spec_dir`].
    #[must_use]
    pub fn resolve_spec_path(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.exists() {
            return path.to_path_buf();
        }
        match self.spec_dir() {
            Some(dir) if dir.join(name).exists() => dir.join(name),
            _ => path.to_path_buf(),
        }
    }
}

/// Parse a boolean flag value. `None` when the value isn't recognized.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

/// Get the user's home directory in a cross-platform way.
pub fn get_home_dir() -> Option<PathBuf> {
    // Try HOME first (Unix-like systems)
    if let Some(home) = env::var_os("HOME") {
        return Some(PathBuf::from(home));
    }

    // Try USERPROFILE (Windows)
    if let Some(userprofile) = env::var_os("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }

    // Try HOMEDRIVE + HOMEPATH (older Windows)
    if let (Some(homedrive), Some(homepath)) = (env::var_os("HOMEDRIVE"), env::var_os("HOMEPATH")) {
        let mut path = PathBuf::from(homedrive);
        path.push(homepath);
        return Some(path);
    }

    None
}
