use crate::status::decode_termination_status;
use crate::stdio::{feed_stdin, Drain};
use procrun_core::{ExecutionResult, ProcrunError, Result};
use std::time::Instant;
use tokio::process::Child;
use tracing::debug;

/// Handle to a started process.
///
/// Dropping the handle neither kills nor waits for the process.
#[derive(Debug)]
pub struct RunningCommand {
    program: String,
    child: Child,
    stdin_bytes: Option<Vec<u8>>,
    stdout: Drain,
    stderr: Drain,
    started: Instant,
}

impl RunningCommand {
    pub(crate) fn new(
        program: String,
        child: Child,
        stdin_bytes: Option<Vec<u8>>,
        stdout: Drain,
        stderr: Drain,
    ) -> Self {
        Self {
            program,
            child,
            stdin_bytes,
            stdout,
            stderr,
            started: Instant::now(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// OS process id, `None` once the process has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Forcibly terminates the process and reaps it.
    pub async fn kill(&mut self) -> Result<()> {
        self.child
            .kill()
            .await
            .map_err(|e| ProcrunError::Wait(format!("failed to kill `{}`: {}", self.program, e)))
    }

    /// Waits for the process to exit, with no time limit.
    ///
    /// Stdin is fed and the output streams are drained while waiting, so a
    /// child producing more output than fits in a pipe cannot stall.
    pub async fn wait(mut self) -> Result<ExecutionResult> {
        let stdin = self.child.stdin.take();
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();

        let (fed, out, err, status) = tokio::join!(
            feed_stdin(stdin, self.stdin_bytes.take()),
            self.stdout.run(stdout),
            self.stderr.run(stderr),
            self.child.wait(),
        );

        let wait_error = |stage: &str, e: std::io::Error| {
            ProcrunError::Wait(format!("{} of `{}` failed: {}", stage, self.program, e))
        };
        fed.map_err(|e| wait_error("writing stdin", e))?;
        let stdout = out.map_err(|e| wait_error("reading stdout", e))?;
        let stderr = err.map_err(|e| wait_error("reading stderr", e))?;
        let status = status.map_err(|e| wait_error("waiting for exit", e))?;

        let exit_code = decode_termination_status(status);
        let duration = self.started.elapsed();
        debug!(
            program = %self.program,
            exit_code,
            duration_ms = duration.as_millis() as u64,
            "Process exited"
        );

        Ok(ExecutionResult::new(
            exit_code,
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr),
            duration,
        ))
    }
}
