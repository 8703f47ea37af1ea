//! External command execution.
//!
//! Launches a child process, suspends the calling task until it exits and
//! turns a non-zero exit status into a [`RunnerError`] that carries the exact
//! argument vector. Standard streams are inherited unless output capture is
//! enabled.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use dxfcheck_core::config::tool::RunnerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The process could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        /// The executable that was launched.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process failed.
    #[error("Failed to wait for {program}: {source}")]
    Wait {
        /// The executable that was launched.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("Command {program} {args:?} failed with {}{}", describe_status(.code), describe_stderr(.stderr))]
    Failed {
        /// The executable that was launched.
        program: String,
        /// The exact argument vector.
        args: Vec<String>,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured stderr, when output capture is enabled.
        stderr: Option<String>,
    },

    /// The process exceeded the configured timeout and was killed.
    #[error("Command {program} {args:?} timed out after {timeout_seconds}s")]
    Timeout {
        /// The executable that was launched.
        program: String,
        /// The exact argument vector.
        args: Vec<String>,
        /// The limit that was exceeded.
        timeout_seconds: u64,
    },
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}

fn describe_stderr(stderr: &Option<String>) -> String {
    match stderr.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            let excerpt: String = text.chars().take(2000).collect();
            format!(": {excerpt}")
        }
        _ => String::new(),
    }
}

/// An executable identity plus its ordered, textual arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLine {
    /// Start a command line for `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument, coerced to text.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Append several arguments, each coerced to text.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// The executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The argument vector (without the program).
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a successful command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code (always 0 on success where the platform reports one).
    pub exit_code: Option<i32>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Captured stdout, when output capture is enabled.
    pub stdout: Option<String>,
}

/// Runs external commands, one attempt per call.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    config: RunnerConfig,
}

impl CommandRunner {
    /// Create a runner with the given settings.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run `command` to completion.
    pub async fn run(&self, command: &CommandLine) -> Result<ExecutionResult, RunnerError> {
        let program = command.program_name();
        let start = Instant::now();

        info!(program = %program, args = ?command.argv(), "Running external command");

        let (stdout_cfg, stderr_cfg) = if self.config.capture_output {
            (Stdio::piped(), Stdio::piped())
        } else {
            (Stdio::inherit(), Stdio::inherit())
        };

        let mut cmd = Command::new(command.program());
        cmd.args(command.argv())
            .stdin(Stdio::null())
            .stdout(stdout_cfg)
            .stderr(stderr_cfg)
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| {
            error!(program = %program, error = %source, "Failed to start external command");
            RunnerError::Spawn {
                program: program.clone(),
                source,
            }
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let waiting = child.wait_with_output();
        let output = match self.config.timeout_seconds {
            Some(limit) => match tokio::time::timeout(Duration::from_secs(limit), waiting).await {
                Ok(result) => result,
                Err(_) => {
                    error!(program = %program, timeout_s = limit, "External command timed out, killed");
                    return Err(RunnerError::Timeout {
                        program,
                        args: command.argv().to_vec(),
                        timeout_seconds: limit,
                    });
                }
            },
            None => waiting.await,
        }
        .map_err(|source| RunnerError::Wait {
            program: program.clone(),
            source,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let (stdout, stderr) = if self.config.capture_output {
            (
                Some(String::from_utf8_lossy(&output.stdout).into_owned()),
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            )
        } else {
            (None, None)
        };

        if let Some(text) = stderr.as_deref().filter(|s| !s.is_empty()) {
            debug!(program = %program, stderr = %text, "External command stderr");
        }

        if !output.status.success() {
            let code = output.status.code();
            error!(
                program = %program,
                args = ?command.argv(),
                code = ?code,
                elapsed_ms = duration_ms,
                "External command failed"
            );
            return Err(RunnerError::Failed {
                program,
                args: command.argv().to_vec(),
                code,
                stderr,
            });
        }

        info!(program = %program, elapsed_ms = duration_ms, "External command completed");

        Ok(ExecutionResult {
            exit_code: output.status.code(),
            duration_ms,
            stdout,
        })
    }
}
