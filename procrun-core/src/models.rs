use crate::error::ProcrunError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exit code used for results synthesized from errors that kept the
/// process from running to completion (spawn failure, timeout, wait error).
///
/// A process that legitimately exits with 255 is indistinguishable from a
/// synthesized failure.
pub const FAILURE_EXIT_CODE: i32 = 255;

/// Outcome of a single process execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    exit_code: i32,
    stdout: String,
    stderr: String,
    duration: Duration,
}

impl ExecutionResult {
    pub fn new(
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration,
        }
    }

    /// Result standing in for a run that never produced one: exit code
    /// [`FAILURE_EXIT_CODE`] with the error text as stderr.
    pub fn from_error(error: &ProcrunError) -> Self {
        Self::new(FAILURE_EXIT_CODE, String::new(), error.to_string(), Duration::ZERO)
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Captured stdout, empty unless the stream was captured.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured stderr, empty unless the stream was captured.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Wall-clock time between spawn and observed exit.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn failed(&self) -> bool {
        !self.success()
    }

    /// Error describing a non-zero exit, or `None` on success.
    ///
    /// The message is taken from stderr: starting at the first non-blank
    /// line, lines ending with `:` are collected together with the line that
    /// completes them, joined by single spaces. This turns chained messages
    /// such as
    ///
    /// ```text
    /// failed to open config:
    /// permission denied
    /// ```
    ///
    /// into `failed to open config: permission denied`. Without any stderr
    /// text the message is `Unknown error: <exit code>`.
    pub fn error(&self) -> Option<ProcrunError> {
        if self.success() {
            return None;
        }

        let mut lines = Vec::new();
        for line in self.stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
            lines.push(line);
            if !line.ends_with(':') {
                break;
            }
        }

        let message = if lines.is_empty() {
            format!("Unknown error: {}", self.exit_code)
        } else {
            lines.join(" ")
        };

        Some(ProcrunError::ExitFailure {
            code: self.exit_code,
            message,
        })
    }
}

/// Status queries for a result that may be absent.
///
/// An absent result always counts as failed, and its error is
/// [`ProcrunError::NilResult`].
pub trait OptionalResult {
    fn failed(&self) -> bool;
    fn error(&self) -> Option<ProcrunError>;
}

impl OptionalResult for Option<&ExecutionResult> {
    fn failed(&self) -> bool {
        self.map_or(true, ExecutionResult::failed)
    }

    fn error(&self) -> Option<ProcrunError> {
        match self {
            Some(result) => result.error(),
            None => Some(ProcrunError::NilResult),
        }
    }
}

impl OptionalResult for Option<ExecutionResult> {
    fn failed(&self) -> bool {
        self.as_ref().failed()
    }

    fn error(&self) -> Option<ProcrunError> {
        self.as_ref().error()
    }
}
