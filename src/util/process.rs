//! Subprocess execution.
//!
//! The orchestrator talks to child processes through the [`Runner`] trait
//! so tests can substitute a stub executor. [`SystemRunner`] is the real
//! implementation on top of `std::process`.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;

/// A fully formed command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ProcessCommand {
    /// Create a command for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        ProcessCommand {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// The command as a single space-joined line, for logs and the
    /// compile-command database.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Why a child process could not be executed.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("program not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: io::Error,
    },

    #[error("i/o error while running `{program}`: {source}")]
    Io {
        program: String,
        source: io::Error,
    },
}

impl ProcessError {
    fn from_io(program: &str, err: io::Error, spawning: bool) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ProcessError::NotFound(program.to_string()),
            io::ErrorKind::PermissionDenied => ProcessError::PermissionDenied(program.to_string()),
            _ if spawning => ProcessError::Spawn {
                program: program.to_string(),
                source: err,
            },
            _ => ProcessError::Io {
                program: program.to_string(),
                source: err,
            },
        }
    }
}

/// Outcome of a completed child process.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// Exit code; None when the child was killed by a signal.
    pub exit_code: Option<i32>,
    /// Terminating signal, when there was one.
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Whether the child exited normally with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Process executor seam.
///
/// `run` spawns the command, waits for it, and captures its output.
/// `exec` replaces the current process image and only returns on failure.
pub trait Runner {
    fn run(&self, cmd: &ProcessCommand) -> Result<ExecOutput, ProcessError>;

    fn exec(&self, cmd: &ProcessCommand) -> ProcessError;
}

/// The real executor on top of `std::process`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn build_command(cmd: &ProcessCommand) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(ref cwd) = cmd.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

impl Runner for SystemRunner {
    fn run(&self, cmd: &ProcessCommand) -> Result<ExecOutput, ProcessError> {
        let mut command = Self::build_command(cmd);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let child = command
            .spawn()
            .map_err(|e| ProcessError::from_io(&cmd.program, e, true))?;

        let output = child
            .wait_with_output()
            .map_err(|e| ProcessError::from_io(&cmd.program, e, false))?;

        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            output.status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Ok(ExecOutput {
            exit_code: output.status.code(),
            signal,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    #[cfg(unix)]
    fn exec(&self, cmd: &ProcessCommand) -> ProcessError {
        use std::os::unix::process::CommandExt;

        let err = Self::build_command(cmd).exec();
        ProcessError::from_io(&cmd.program, err, true)
    }

    #[cfg(not(unix))]
    fn exec(&self, cmd: &ProcessCommand) -> ProcessError {
        // No process replacement available: spawn the new image and leave
        // with its exit code.
        match Self::build_command(cmd).status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(e) => ProcessError::from_io(&cmd.program, e, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let cmd = ProcessCommand::new("gcc").args(["-Wall", "-o", "output", "input.c"]);
        assert_eq!(cmd.display_command(), "gcc -Wall -o output input.c");
    }

    #[test]
    fn test_run_captures_stdout() {
        let cmd = ProcessCommand::new("echo").arg("hello");
        let out = SystemRunner.run(&cmd).unwrap();
        assert!(out.success());
        assert!(out.stdout.contains("hello"));
    }

    #[test]
    fn test_run_missing_program() {
        let cmd = ProcessCommand::new("definitely-not-a-real-program-xyz");
        match SystemRunner.run(&cmd) {
            Err(ProcessError::NotFound(program)) => {
                assert_eq!(program, "definitely-not-a-real-program-xyz");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_run_nonzero_exit() {
        let cmd = ProcessCommand::new("sh").args(["-c", "echo oops >&2; exit 3"]);
        let out = SystemRunner.run(&cmd).unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, Some(3));
        assert!(out.stderr.contains("oops"));
    }
}
