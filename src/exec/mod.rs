//! Shell command execution with concurrent stream capture.
//!
//! [`Runner::run`] executes one fully rendered shell command;
//! [`Runner::chain`] pipes two of them together. Both honour dry-run mode,
//! surface output incrementally, and route non-zero exit codes through the
//! reporter's fatal path unless the caller opts out. There is deliberately
//! no timeout or retry here: workflows rely on commands running to
//! completion, long builds included, and any timeout policy belongs to the
//! caller.

use std::io::{self, Write};
use std::process::{Child, Command, Stdio};

use thiserror::Error;

use crate::report::Reporter;

mod stream;

pub use stream::LOGIN_BANNER;

/// Shell used to interpret command text.
const SHELL: &str = "sh";

/// Mask substituted for redacted substrings in logged output.
pub const MASK: &str = "********";

/// Execution mode for a [`CommandSpec`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Render and echo the command without ever spawning a process.
    Dry,
    /// Spawn the command and capture its output.
    #[default]
    Live,
}

/// One unit of work submitted to the runner.
///
/// The text is the literal shell command, already fully rendered; no
/// templating happens at this layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandSpec {
    /// Literal shell command to execute.
    pub text: String,
    /// Optional literal substring replaced by [`MASK`] before logging.
    /// Redaction never changes the text actually executed.
    pub redact: Option<String>,
    /// Dry-run or live execution.
    pub mode: Mode,
    /// Echo command and output to the controlling terminal.
    pub verbose: bool,
}

impl CommandSpec {
    /// Creates a spec with explicit mode and verbosity.
    #[must_use]
    pub fn new(text: impl Into<String>, mode: Mode, verbose: bool) -> Self {
        Self {
            text: text.into(),
            redact: None,
            mode,
            verbose,
        }
    }

    /// Creates a quiet live-mode spec.
    #[must_use]
    pub fn live(text: impl Into<String>) -> Self {
        Self::new(text, Mode::Live, false)
    }

    /// Creates a dry-run spec.
    #[must_use]
    pub fn dry(text: impl Into<String>) -> Self {
        Self::new(text, Mode::Dry, false)
    }

    /// Marks a literal substring for masking in logged output.
    #[must_use]
    pub fn with_redact(mut self, secret: impl Into<String>) -> Self {
        self.redact = Some(secret.into());
        self
    }

    /// Command text with the redacted substring masked, safe to log.
    #[must_use]
    pub fn logged_text(&self) -> String {
        match &self.redact {
            Some(secret) if !secret.is_empty() => self.text.replace(secret.as_str(), MASK),
            _ => self.text.clone(),
        }
    }
}

/// Outcome of running a [`CommandSpec`].
///
/// In dry mode the exit code is always zero and both streams are empty.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExecutionResult {
    /// Captured standard output, accumulated as it streamed.
    pub stdout: String,
    /// Captured standard error with login-banner lines removed.
    pub stderr: String,
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl ExecutionResult {
    /// True when the exit code is zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors surfaced while starting a command.
///
/// A command that starts but exits non-zero is not an error at this level;
/// it is reported through the exit code and the fail/continue policy.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ExecError {
    /// Raised when the shell cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
}

/// Executes rendered shell commands and classifies their results.
#[derive(Clone, Copy, Debug, Default)]
pub struct Runner {
    reporter: Reporter,
}

impl Runner {
    /// Creates a runner logging through `reporter`.
    #[must_use]
    pub const fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }

    /// Returns the logging hook used by this runner.
    #[must_use]
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Runs one command and returns its captured output and exit code.
    ///
    /// The (redacted) command text is echoed before execution in dry or
    /// verbose mode. In dry mode nothing is spawned and the result is
    /// empty with exit code zero. On a non-zero exit with `exit_on_fail`
    /// set, the code is reported and the process terminates through the
    /// reporter's fatal path; otherwise the code is returned for the
    /// caller to inspect.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] when the shell cannot be started.
    pub fn run(
        &self,
        spec: &CommandSpec,
        exit_on_fail: bool,
    ) -> Result<ExecutionResult, ExecError> {
        let logged = spec.logged_text();
        self.reporter.command(&logged);
        if spec.mode == Mode::Dry || spec.verbose {
            echo(&logged);
        }
        if spec.mode == Mode::Dry {
            return Ok(ExecutionResult::default());
        }

        let mut child = spawn_shell(&spec.text, Stdio::inherit(), Stdio::piped())?;
        let output = stream::drain(&mut child, &self.reporter, spec.verbose);
        let exit_code = wait_code(&mut child);
        self.check(exit_code, exit_on_fail, spec.verbose);

        Ok(ExecutionResult {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }

    /// Pipes the first command's stdout into the second command's stdin and
    /// returns the second command's captured output.
    ///
    /// The first command's stderr is discarded. The pipeline is dry when
    /// either spec is dry and verbose when either is verbose. Both exit
    /// codes are checked independently under the same fail/continue policy
    /// as [`Runner::run`]; the returned exit code is the first stage's when
    /// non-zero, otherwise the second stage's.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] when either shell cannot be started.
    pub fn chain(
        &self,
        first: &CommandSpec,
        second: &CommandSpec,
        exit_on_fail: bool,
    ) -> Result<ExecutionResult, ExecError> {
        let dry = first.mode == Mode::Dry || second.mode == Mode::Dry;
        let verbose = first.verbose || second.verbose;
        let pipeline = format!("{} | {}", first.logged_text(), second.logged_text());
        self.reporter.command(&pipeline);
        if dry || verbose {
            echo(&pipeline);
        }
        if dry {
            return Ok(ExecutionResult::default());
        }

        let mut producer = Command::new(SHELL)
            .arg("-c")
            .arg(&first.text)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;
        let Some(pipe) = producer.stdout.take() else {
            producer.kill().ok();
            producer.wait().ok();
            return Err(ExecError::Spawn {
                program: SHELL.to_owned(),
                message: String::from("producer stdout was not captured"),
            });
        };
        let spawned = Command::new(SHELL)
            .arg("-c")
            .arg(&second.text)
            .stdin(Stdio::from(pipe))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut consumer = match spawned {
            Ok(child) => child,
            Err(err) => {
                producer.kill().ok();
                producer.wait().ok();
                return Err(spawn_error(err));
            }
        };

        // Drain the consumer before waiting on the producer: the pipe
        // between them has finite capacity, and waiting first would leave
        // both processes blocked on a full buffer.
        let output = stream::drain(&mut consumer, &self.reporter, verbose);
        let consumer_code = wait_code(&mut consumer);
        let producer_code = wait_code(&mut producer);
        self.check(producer_code, exit_on_fail, verbose);
        self.check(consumer_code, exit_on_fail, verbose);

        let exit_code = if producer_code == 0 {
            consumer_code
        } else {
            producer_code
        };
        Ok(ExecutionResult {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }

    fn check(&self, code: i32, exit_on_fail: bool, verbose: bool) {
        if code == 0 {
            return;
        }
        self.reporter.answer(&format!("returned code {code}"));
        if exit_on_fail {
            self.reporter
                .fail("could not complete the requested action", verbose);
        }
    }
}

fn spawn_shell(text: &str, stdin: Stdio, stderr: Stdio) -> Result<Child, ExecError> {
    Command::new(SHELL)
        .arg("-c")
        .arg(text)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(stderr)
        .spawn()
        .map_err(spawn_error)
}

fn spawn_error(err: io::Error) -> ExecError {
    ExecError::Spawn {
        program: SHELL.to_owned(),
        message: err.to_string(),
    }
}

fn wait_code(child: &mut Child) -> i32 {
    child
        .wait()
        .ok()
        .and_then(|status| status.code())
        .unwrap_or(-1)
}

fn echo(text: &str) {
    let mut out = io::stdout().lock();
    writeln!(out, "{text}").ok();
    out.flush().ok();
}

#[cfg(test)]
mod tests;
