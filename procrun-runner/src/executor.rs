use crate::command::CommandSpec;
use crate::process::RunnerConfig;
use procrun_core::{ExecutionResult, ProcrunError, Result};
use tracing::{error, info, warn};

/// Runs command specs to completion or timeout.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a spec and collect its result.
    ///
    /// Waiting happens on a background task that races the spec's timeout.
    /// Whichever finishes first decides the outcome:
    ///
    /// - completion yields the result, whatever the exit code;
    /// - the timeout yields [`ProcrunError::Timeout`]. The waiter task is
    ///   detached and the process is left running, not killed.
    ///
    /// Spawn failures and errors while waiting are returned as errors.
    pub async fn run(&self, spec: CommandSpec) -> Result<ExecutionResult> {
        let spec = self.config.apply(spec);
        let timeout = spec.get_timeout();
        let running = spec.start()?;
        let program = running.program().to_string();
        let pid = running.id();

        let waiter = tokio::spawn(running.wait());

        let joined = match timeout {
            Some(limit) => tokio::select! {
                joined = waiter => joined,
                _ = tokio::time::sleep(limit) => {
                    warn!(
                        program = %program,
                        pid = ?pid,
                        timeout_ms = limit.as_millis() as u64,
                        "Process timed out, leaving it running"
                    );
                    return Err(ProcrunError::Timeout(limit));
                }
            },
            None => waiter.await,
        };

        let result = joined
            .map_err(|e| ProcrunError::Wait(format!("waiter for `{}` failed: {}", program, e)))??;

        info!(
            program = %program,
            exit_code = result.exit_code(),
            duration_ms = result.duration().as_millis() as u64,
            "Process completed"
        );

        Ok(result)
    }

    /// Like [`ProcessRunner::run`], but never fails.
    ///
    /// Errors become a result with exit code
    /// [`procrun_core::FAILURE_EXIT_CODE`] and the error text as stderr, so
    /// they cannot be told apart from a process exiting with 255.
    pub async fn run_lenient(&self, spec: CommandSpec) -> ExecutionResult {
        let program = spec.get_program().to_string_lossy().into_owned();
        match self.run(spec).await {
            Ok(result) => result,
            Err(e) => {
                error!(program = %program, error = %e, "Process could not be run");
                ExecutionResult::from_error(&e)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::stdio::OutputSink;
    use procrun_core::FAILURE_EXIT_CODE;
    use std::path::PathBuf;
    use std::process::Stdio;
    use std::time::{Duration, Instant};
    use tokio::io::AsyncReadExt;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let result = ProcessRunner::new()
            .run(sh("echo hello; echo oops >&2"))
            .await
            .unwrap();

        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.stdout(), "hello\n");
        assert_eq!(result.stderr(), "oops\n");
        assert!(!result.failed());
        assert!(result.error().is_none());
    }

    #[tokio::test]
    async fn test_run_non_zero_exit_is_not_an_error() {
        let result = ProcessRunner::new().run(sh("exit 3")).await.unwrap();

        assert_eq!(result.exit_code(), 3);
        assert!(result.failed());
        assert_eq!(result.error().unwrap().to_string(), "Unknown error: 3");
    }

    #[tokio::test]
    async fn test_run_error_from_stderr() {
        let script = "printf 'failed to open config:\\nfailed to open file:\\npermission denied\\n' >&2; exit 1";
        let result = ProcessRunner::new().run(sh(script)).await.unwrap();

        assert_eq!(
            result.error().unwrap().to_string(),
            "failed to open config: failed to open file: permission denied"
        );
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let started = Instant::now();
        let err = ProcessRunner::new()
            .run(sh("sleep 5").timeout(Duration::from_millis(50)))
            .await
            .unwrap_err();

        assert!(matches!(err, ProcrunError::Timeout(limit) if limit == Duration::from_millis(50)));
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_run_completes_within_timeout() {
        let result = ProcessRunner::new()
            .run(sh("echo quick").timeout(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(result.stdout(), "quick\n");
    }

    #[tokio::test]
    async fn test_zero_timeout_means_no_timeout() {
        let result = ProcessRunner::new()
            .run(sh("sleep 0.1; exit 4").timeout(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(result.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let err = ProcessRunner::new()
            .run(CommandSpec::new("procrun-definitely-not-a-real-program"))
            .await
            .unwrap_err();

        match err {
            ProcrunError::Spawn { program, .. } => {
                assert_eq!(program, "procrun-definitely-not-a-real-program")
            }
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_working_directory_is_spawn_failure() {
        let err = ProcessRunner::new()
            .run(sh("true").current_dir("/procrun/does/not/exist"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcrunError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_working_directory() {
        let result = ProcessRunner::new()
            .run(CommandSpec::new("pwd").current_dir("/"))
            .await
            .unwrap();
        assert_eq!(result.stdout().trim(), "/");
    }

    #[tokio::test]
    async fn test_environment_is_applied() {
        let result = ProcessRunner::new()
            .run(
                sh("echo \"$GREETING-${SECRET:-none}\"")
                    .env(["PATH=/usr/bin:/bin", "GREETING=hi", "SECRET=s3cr3t"])
                    .remove_env(["SECRET*"]),
            )
            .await
            .unwrap();
        assert_eq!(result.stdout(), "hi-none\n");
    }

    #[tokio::test]
    async fn test_empty_env() {
        let result = ProcessRunner::new()
            .run(CommandSpec::new("/usr/bin/env").empty_env())
            .await
            .unwrap();
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.stdout(), "");
    }

    #[tokio::test]
    async fn test_stdin_bytes() {
        let result = ProcessRunner::new()
            .run(CommandSpec::new("cat").stdin_bytes("piped input"))
            .await
            .unwrap();
        assert_eq!(result.stdout(), "piped input");
    }

    #[tokio::test]
    async fn test_default_stdin_is_empty() {
        let result = ProcessRunner::new().run(CommandSpec::new("cat")).await.unwrap();
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.stdout(), "");
    }

    #[tokio::test]
    async fn test_redirected_streams_are_not_captured() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let result = ProcessRunner::new()
            .run(
                sh("echo to-writer; echo to-null >&2; exit 2")
                    .stdout(OutputSink::writer(writer))
                    .stderr(OutputSink::Stdio(Stdio::null())),
            )
            .await
            .unwrap();

        assert_eq!(result.exit_code(), 2);
        assert_eq!(result.stdout(), "");
        assert_eq!(result.stderr(), "");

        let mut forwarded = String::new();
        reader.read_to_string(&mut forwarded).await.unwrap();
        assert_eq!(forwarded, "to-writer\n");
    }

    #[tokio::test]
    async fn test_closed_sink_is_wait_error() {
        let (writer, reader) = tokio::io::duplex(64);
        drop(reader);

        let err = ProcessRunner::new()
            .run(sh("echo hello").stdout(OutputSink::writer(writer)))
            .await
            .unwrap_err();

        match err {
            ProcrunError::Wait(message) => assert!(message.contains("reading stdout")),
            other => panic!("expected wait error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_large_output_does_not_stall() {
        let result = ProcessRunner::new()
            .run(sh("head -c 1000000 /dev/zero | tr '\\0' 'x'; head -c 200000 /dev/zero >&2"))
            .await
            .unwrap();
        assert_eq!(result.stdout().len(), 1_000_000);
        assert_eq!(result.stderr().len(), 200_000);
    }

    #[tokio::test]
    async fn test_signal_exit_code() {
        let result = ProcessRunner::new().run(sh("kill -9 $$")).await.unwrap();
        assert_eq!(result.exit_code(), 137);
        assert!(result.failed());
    }

    #[tokio::test]
    async fn test_terminated_exit_code() {
        let result = ProcessRunner::new().run(sh("kill -TERM $$")).await.unwrap();
        assert_eq!(result.exit_code(), 143);
        assert_eq!(result.error().unwrap().to_string(), "Unknown error: 143");
    }

    #[tokio::test]
    async fn test_config_timeout_applies() {
        let runner = ProcessRunner::new().with_config(RunnerConfig {
            timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let err = runner.run(sh("sleep 5")).await.unwrap_err();
        assert!(matches!(err, ProcrunError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_config_working_directory_applies() {
        let runner = ProcessRunner::new().with_config(RunnerConfig {
            working_directory: Some(PathBuf::from("/")),
            ..Default::default()
        });
        let result = runner.run(CommandSpec::new("pwd")).await.unwrap();
        assert_eq!(result.stdout().trim(), "/");
    }

    #[tokio::test]
    async fn test_run_lenient_downgrades_errors() {
        let runner = ProcessRunner::new();

        let result = runner
            .run_lenient(CommandSpec::new("procrun-definitely-not-a-real-program"))
            .await;
        assert_eq!(result.exit_code(), FAILURE_EXIT_CODE);
        assert!(result.stderr().contains("procrun-definitely-not-a-real-program"));

        let result = runner
            .run_lenient(sh("sleep 5").timeout(Duration::from_millis(20)))
            .await;
        assert_eq!(result.exit_code(), FAILURE_EXIT_CODE);
        assert!(result.stderr().starts_with("timeout"));

        let result = runner.run_lenient(sh("exit 9")).await;
        assert_eq!(result.exit_code(), 9);
    }
}
