use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcrunError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("wait error: {0}")]
    Wait(String),

    /// Non-zero exit, elevated to an error by [`crate::ExecutionResult::error`].
    /// Displays as the message extracted from stderr.
    #[error("{message}")]
    ExitFailure { code: i32, message: String },

    #[error("result is nil")]
    NilResult,
}

impl ProcrunError {
    /// Exit code carried by an [`ProcrunError::ExitFailure`].
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcrunError::ExitFailure { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcrunError>;
