use clap::Parser;
use procrun_core::{ExecutionResult, FAILURE_EXIT_CODE};
use procrun_runner::{CommandSpec, ProcessRunner};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(name = "procrun")]
#[command(about = "Run a command with an optional timeout and report how it ended", long_about = None)]
struct Cli {
    /// Timeout in milliseconds (0 disables it)
    #[arg(short, long, default_value = "0")]
    timeout: u64,

    /// Working directory for the command
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Start from an empty environment instead of inheriting this one
    #[arg(long)]
    empty_env: bool,

    /// Keep only variables matching this wildcard pattern (repeatable)
    #[arg(long = "keep-env", value_name = "GLOB")]
    keep_env: Vec<String>,

    /// Remove variables matching this wildcard pattern (repeatable)
    #[arg(long = "remove-env", value_name = "GLOB")]
    remove_env: Vec<String>,

    /// Print the result as JSON instead of replaying the output
    #[arg(long)]
    json: bool,

    /// Report errors as a result with exit code 255 instead of failing
    #[arg(long)]
    never_fail: bool,

    /// Program and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl Cli {
    fn to_spec(&self) -> CommandSpec {
        let program = self.command.first().map(String::as_str).unwrap_or_default();
        let mut spec = CommandSpec::new(program).args(self.command.iter().skip(1));
        if let Some(dir) = &self.dir {
            spec = spec.current_dir(dir);
        }
        if self.empty_env {
            spec = spec.empty_env();
        }
        if !self.keep_env.is_empty() {
            spec = spec.limit_env(&self.keep_env);
        }
        if !self.remove_env.is_empty() {
            spec = spec.remove_env(&self.remove_env);
        }
        if self.timeout > 0 {
            spec = spec.timeout(Duration::from_millis(self.timeout));
        }
        spec
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runner = ProcessRunner::new();
    let spec = cli.to_spec();

    let result = if cli.never_fail {
        runner.run_lenient(spec).await
    } else {
        match runner.run(spec).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Command could not be run");
                eprintln!("procrun: {}", e);
                process::exit(FAILURE_EXIT_CODE);
            }
        }
    };

    report(&result, cli.json)?;

    if let Some(line) = failure_line(&result) {
        warn!(exit_code = result.exit_code(), "Command failed");
        eprintln!("{}", line);
    }

    process::exit(exit_status(result.exit_code()))
}

fn report(result: &ExecutionResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(result.stdout().as_bytes())?;
    stdout.flush()?;

    let mut stderr = std::io::stderr().lock();
    stderr.write_all(result.stderr().as_bytes())?;
    stderr.flush()?;
    Ok(())
}

/// Summary printed to stderr when the command exited non-zero.
fn failure_line(result: &ExecutionResult) -> Option<String> {
    result.error().map(|err| format!("procrun: {}", err))
}

/// Exit status for this process; codes outside 0..=255 become 255.
fn exit_status(code: i32) -> i32 {
    if (0..=255).contains(&code) {
        code
    } else {
        FAILURE_EXIT_CODE
    }
}
