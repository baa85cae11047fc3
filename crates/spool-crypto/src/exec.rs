//! # Bounded Subprocess Execution
//!
//! Every external helper (the Poseidon hash binary, the circuit prover) runs
//! through [`ExternalExecutor::run`]. The caller gets a typed
//! [`ExecOutcome`] instead of an `io::Result` so that "the helper said no",
//! "the helper hung" and "the helper could not start" are handled
//! separately at each call site.
//!
//! A timed-out child is killed: the output future is dropped and the child
//! was spawned with `kill_on_drop(true)`.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Result of running an external program to completion (or not).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exit status 0.
    Completed { stdout: String },
    /// The deadline elapsed; the child has been killed.
    TimedOut,
    /// Nonzero exit, death by signal (`code: None`), or spawn failure
    /// (`code: None`, the OS error in `stderr`).
    Failed { code: Option<i32>, stderr: String },
}

impl ExecOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Runs programs with a hard deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalExecutor;

impl ExternalExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `program` with `args`, waiting at most `timeout`.
    ///
    /// Stdin is closed; stdout and stderr are captured in full and decoded
    /// lossily as UTF-8.
    pub async fn run<I, S>(&self, program: &Path, args: I, timeout: Duration) -> ExecOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(timeout, child).await {
            Err(_) => {
                tracing::debug!(program = %program.display(), ?timeout, "subprocess timed out");
                ExecOutcome::TimedOut
            }
            Ok(Err(e)) => ExecOutcome::Failed {
                code: None,
                stderr: format!("failed to spawn {}: {e}", program.display()),
            },
            Ok(Ok(output)) if output.status.success() => ExecOutcome::Completed {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            },
            Ok(Ok(output)) => ExecOutcome::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
        }
    }
}
