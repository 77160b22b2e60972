//! Advisory logging and the fatal-failure choke point.
//!
//! Every command string, output chunk, and progress note flows through
//! [`Reporter`] as `tracing` events. Fatal errors funnel through
//! [`Reporter::fail`], the single place a failed action terminates the
//! process; nothing else in the crate calls `process::exit` on failure.

use std::io::{self, Write};
use std::process;

/// Exit status used when a workflow is aborted through [`Reporter::fail`].
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Logging hook shared by the command runner and the workflow glue.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reporter;

impl Reporter {
    /// Creates a reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Records a command string about to be executed.
    ///
    /// Callers must redact secrets before logging; the runner passes the
    /// masked form here and executes the original.
    pub fn command(&self, text: &str) {
        tracing::debug!(target: "routeforge::command", "{text}");
    }

    /// Records a chunk of child-process output as it arrives.
    pub fn answer(&self, text: &str) {
        tracing::debug!(target: "routeforge::answer", "{text}");
    }

    /// Advisory progress note; never affects control flow.
    pub fn note(&self, text: &str) {
        tracing::info!("{text}");
    }

    /// Reports a completed workflow step.
    pub fn completed(&self, text: &str) {
        tracing::info!("{text}");
    }

    /// Logs `message`, optionally echoes it to the terminal, flushes both
    /// standard streams best-effort, and terminates the process with a
    /// non-zero status.
    pub fn fail(&self, message: &str, verbose: bool) -> ! {
        tracing::error!("{message}");
        if verbose {
            writeln!(io::stderr().lock(), "{message}").ok();
        }
        io::stdout().lock().flush().ok();
        io::stderr().lock().flush().ok();
        process::exit(FAILURE_EXIT_CODE);
    }
}
