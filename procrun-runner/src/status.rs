//! Decoding of OS termination status into an exit code.

use std::process::ExitStatus;

/// Added to the signal number for processes killed by a signal, following
/// the shell convention (`SIGKILL` → 137).
#[cfg(unix)]
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Exit code for a terminated process.
///
/// A normal exit yields its exit value. On unix a process terminated by a
/// signal yields [`SIGNAL_EXIT_BASE`] plus the signal number.
#[cfg(unix)]
pub fn decode_termination_status(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        return code;
    }
    match status.signal() {
        Some(signal) => SIGNAL_EXIT_BASE + signal,
        None => -1,
    }
}

/// Exit code for a terminated process.
#[cfg(not(unix))]
pub fn decode_termination_status(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
