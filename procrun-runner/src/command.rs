use crate::env::{EnvMatcher, Environment, FilterMode};
use crate::running::RunningCommand;
use crate::stdio::{OutputSink, StdinSource};
use procrun_core::{ProcrunError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// A pending process invocation.
///
/// Built with chained setters and consumed by [`CommandSpec::start`] or
/// [`crate::ProcessRunner::run`], so a spec runs at most once.
///
/// ```rust,no_run
/// # async fn demo() -> procrun_runner::Result<()> {
/// use procrun_runner::{CommandSpec, ProcessRunner};
/// use std::time::Duration;
///
/// let spec = CommandSpec::new("git")
///     .args(["status", "--short"])
///     .current_dir("/srv/repo")
///     .limit_env(["PATH", "HOME", "LC_*"])
///     .timeout(Duration::from_secs(10));
///
/// let result = ProcessRunner::new().run(spec).await?;
/// if let Some(err) = result.error() {
///     eprintln!("git failed: {err}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
    env: Environment,
    env_matcher: EnvMatcher,
    stdin: StdinSource,
    stdout: OutputSink,
    stderr: OutputSink,
    timeout: Option<Duration>,
}

impl CommandSpec {
    /// Describes a run of `program`, looked up with the OS search rules at
    /// spawn time. Output is captured, stdin is empty, the environment is
    /// inherited and there is no timeout.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            working_dir: None,
            env: Environment::Inherit,
            env_matcher: EnvMatcher::new(),
            stdin: StdinSource::Null,
            stdout: OutputSink::Capture,
            stderr: OutputSink::Capture,
            timeout: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Working directory for the child. An empty path keeps the caller's.
    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        let dir = dir.as_ref();
        self.working_dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir.to_path_buf())
        };
        self
    }

    /// Replaces the environment with `NAME=VALUE` entries.
    pub fn env<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env = Environment::Explicit(entries.into_iter().map(Into::into).collect());
        self
    }

    /// Appends `NAME=VALUE` entries to the current environment. An inherited
    /// environment is copied first.
    pub fn envs<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut current = self.env.entries();
        current.extend(entries.into_iter().map(Into::into));
        self.env = Environment::Explicit(current);
        self
    }

    /// Starts the child with no environment variables at all.
    pub fn empty_env(mut self) -> Self {
        self.env = Environment::Explicit(Vec::new());
        self
    }

    /// Goes back to inheriting the caller's environment.
    pub fn inherit_env(mut self) -> Self {
        self.env = Environment::Inherit;
        self
    }

    /// Case policy used by [`CommandSpec::remove_env`] and
    /// [`CommandSpec::limit_env`]. Defaults to the platform's.
    pub fn env_matcher(mut self, matcher: EnvMatcher) -> Self {
        self.env_matcher = matcher;
        self
    }

    /// Drops variables whose name matches any of the wildcard `patterns`.
    pub fn remove_env<I, S>(self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter_env(patterns, FilterMode::Remove)
    }

    /// Drops variables whose name matches none of the wildcard `patterns`.
    pub fn limit_env<I, S>(self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter_env(patterns, FilterMode::Limit)
    }

    fn filter_env<I, S>(mut self, patterns: I, mode: FilterMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|pattern| pattern.as_ref().to_string())
            .collect();
        let before = self.env.entries();
        let total = before.len();
        let kept = self.env_matcher.filter(before, &patterns, mode);
        debug!(
            mode = ?mode,
            patterns = ?patterns,
            kept = kept.len(),
            removed = total - kept.len(),
            "Filtered environment"
        );
        self.env = Environment::Explicit(kept);
        self
    }

    pub fn stdin(mut self, source: StdinSource) -> Self {
        self.stdin = source;
        self
    }

    /// Feeds `bytes` to the child's stdin.
    pub fn stdin_bytes<B: Into<Vec<u8>>>(self, bytes: B) -> Self {
        self.stdin(StdinSource::Bytes(bytes.into()))
    }

    pub fn stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    /// Wall-clock limit for [`crate::ProcessRunner::run`]. Zero disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get_program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn get_env(&self) -> &Environment {
        &self.env
    }

    /// Configured timeout, `None` when unset or zero.
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }

    pub(crate) fn has_timeout_setting(&self) -> bool {
        self.timeout.is_some()
    }

    /// Spawns the process and returns without waiting for it.
    ///
    /// The timeout is not applied here; it belongs to
    /// [`crate::ProcessRunner::run`].
    ///
    /// # Panics
    ///
    /// Panics when called outside the context of a tokio runtime.
    pub fn start(self) -> Result<RunningCommand> {
        let program = self.program.to_string_lossy().into_owned();

        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(false);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        if let Environment::Explicit(entries) = &self.env {
            command.env_clear();
            for entry in entries {
                match entry.split_once('=') {
                    Some((name, value)) => {
                        command.env(name, value);
                    }
                    None => warn!(entry = %entry, "Skipping env entry without '='"),
                }
            }
        }

        let (stdin, stdin_bytes) = self.stdin.into_parts();
        let (stdout, stdout_drain) = self.stdout.into_parts();
        let (stderr, stderr_drain) = self.stderr.into_parts();
        command.stdin(stdin).stdout(stdout).stderr(stderr);

        let child = command.spawn().map_err(|source| ProcrunError::Spawn {
            program: program.clone(),
            source,
        })?;

        debug!(program = %program, pid = ?child.id(), "Process started");

        Ok(RunningCommand::new(
            program,
            child,
            stdin_bytes,
            stdout_drain,
            stderr_drain,
        ))
    }
}
