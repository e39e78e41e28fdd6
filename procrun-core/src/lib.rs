pub mod error;
pub mod models;

pub use error::{ProcrunError, Result};
pub use models::{ExecutionResult, OptionalResult, FAILURE_EXIT_CODE};
