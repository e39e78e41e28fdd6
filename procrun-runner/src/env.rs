//! Environment variable filtering by wildcard name patterns.

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

/// Environment handed to a child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    /// The caller's environment, as it is at spawn time.
    #[default]
    Inherit,
    /// Exactly these `NAME=VALUE` entries. Empty means a cleared environment.
    Explicit(Vec<String>),
}

impl Environment {
    /// Entries this environment resolves to right now.
    ///
    /// Inherited names and values that are not valid UTF-8 are converted
    /// lossily, so such a variable reaches the child altered once the
    /// environment has been copied (for example by a filter).
    pub fn entries(&self) -> Vec<String> {
        match self {
            Environment::Inherit => std::env::vars_os()
                .map(|(name, value)| {
                    format!("{}={}", name.to_string_lossy(), value.to_string_lossy())
                })
                .collect(),
            Environment::Explicit(entries) => entries.clone(),
        }
    }
}

/// Which side of a match survives filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Drop entries whose name matches any pattern.
    Remove,
    /// Keep only entries whose name matches at least one pattern.
    Limit,
}

/// Variable name of a `NAME=VALUE` entry.
pub fn env_name(entry: &str) -> &str {
    entry.split_once('=').map_or(entry, |(name, _)| name)
}

/// Matches environment variable names against glob patterns (`*`, `?`,
/// `[...]`).
///
/// Names compare case-sensitively, except on Windows where environment
/// names are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvMatcher {
    case_insensitive: bool,
}

impl EnvMatcher {
    pub fn new() -> Self {
        Self {
            case_insensitive: cfg!(windows),
        }
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// True if `name` matches any of `patterns`.
    pub fn matches<S: AsRef<str>>(&self, name: &str, patterns: &[S]) -> bool {
        let matchers = self.compile(patterns);
        self.matches_compiled(name, &matchers)
    }

    /// Filters `entries` by their names. Entry order is preserved.
    pub fn filter<S: AsRef<str>>(
        &self,
        entries: Vec<String>,
        patterns: &[S],
        mode: FilterMode,
    ) -> Vec<String> {
        let matchers = self.compile(patterns);
        entries
            .into_iter()
            .filter(|entry| {
                let matched = self.matches_compiled(env_name(entry), &matchers);
                match mode {
                    FilterMode::Remove => !matched,
                    FilterMode::Limit => matched,
                }
            })
            .collect()
    }

    // Malformed patterns are dropped here, so they never match.
    fn compile<S: AsRef<str>>(&self, patterns: &[S]) -> Vec<GlobMatcher> {
        patterns
            .iter()
            .filter_map(|pattern| {
                let pattern = pattern.as_ref();
                match GlobBuilder::new(pattern)
                    .case_insensitive(self.case_insensitive)
                    .build()
                {
                    Ok(glob) => Some(glob.compile_matcher()),
                    Err(e) => {
                        debug!(pattern = %pattern, error = %e, "Ignoring malformed env pattern");
                        None
                    }
                }
            })
            .collect()
    }

    fn matches_compiled(&self, name: &str, matchers: &[GlobMatcher]) -> bool {
        matchers.iter().any(|matcher| matcher.is_match(name))
    }
}

impl Default for EnvMatcher {
    fn default() -> Self {
        Self::new()
    }
}
