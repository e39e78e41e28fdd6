//! One-call entry points with default settings.

use crate::command::CommandSpec;
use crate::executor::ProcessRunner;
use crate::running::RunningCommand;
use procrun_core::{ExecutionResult, Result};
use std::ffi::OsStr;

/// Runs `program` with `args` and never fails.
///
/// Output is captured and there is no timeout. A program that cannot be run
/// yields exit code [`procrun_core::FAILURE_EXIT_CODE`] with the error text
/// as stderr. A program that itself exits with 255 looks the same.
pub async fn run<P, I, S>(program: P, args: I) -> ExecutionResult
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    ProcessRunner::new()
        .run_lenient(CommandSpec::new(program).args(args))
        .await
}

/// Runs `program` with `args`, returning spawn and wait errors.
///
/// A non-zero exit is still `Ok`; see [`ExecutionResult::error`].
pub async fn run_checked<P, I, S>(program: P, args: I) -> Result<ExecutionResult>
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    ProcessRunner::new()
        .run(CommandSpec::new(program).args(args))
        .await
}

/// Starts `program` with `args` and returns without waiting.
///
/// # Panics
///
/// Panics when called outside the context of a tokio runtime.
pub fn start<P, I, S>(program: P, args: I) -> Result<RunningCommand>
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    CommandSpec::new(program).args(args).start()
}
