//! Single-shot execution of local processes.
//!
//! A [`CommandSpec`] describes the invocation, [`ProcessRunner::run`] starts
//! it, races its exit against an optional timeout and returns an
//! [`ExecutionResult`] holding the exit code and captured output.

pub mod command;
pub mod convenience;
pub mod env;
pub mod executor;
pub mod process;
pub mod running;
pub mod status;
pub mod stdio;

pub use command::CommandSpec;
pub use convenience::{run, run_checked, start};
pub use env::{env_name, EnvMatcher, Environment, FilterMode};
pub use executor::ProcessRunner;
pub use process::RunnerConfig;
pub use running::RunningCommand;
pub use status::decode_termination_status;
pub use stdio::{OutputSink, StdinSource};

pub use procrun_core::{ExecutionResult, OptionalResult, ProcrunError, Result};
