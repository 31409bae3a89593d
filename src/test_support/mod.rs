//! Test utilities: a stub process executor.
//!
//! The stub records every command, reports success, and materializes an
//! empty file at each command's declared output so freshness checks
//! behave as if the real tool had run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::util::process::{ExecOutput, ProcessCommand, ProcessError, Runner};

#[derive(Default)]
struct StubState {
    commands: Vec<ProcessCommand>,
    execs: Vec<ProcessCommand>,
}

/// A recording process runner for tests.
///
/// Cloning shares the recorded state, so a test can keep a handle while
/// the orchestrator owns the boxed runner.
#[derive(Clone, Default)]
pub struct StubRunner {
    state: Arc<Mutex<StubState>>,
    fail_pattern: Option<String>,
}

impl StubRunner {
    /// A stub where every command succeeds.
    pub fn new() -> Self {
        StubRunner::default()
    }

    /// A stub where every command fails with exit code 1.
    pub fn failing() -> Self {
        StubRunner {
            state: Arc::default(),
            fail_pattern: Some(String::new()),
        }
    }

    /// A stub that fails exactly the commands whose rendered command line
    /// contains `pattern`.
    pub fn fail_matching(pattern: impl Into<String>) -> Self {
        StubRunner {
            state: Arc::default(),
            fail_pattern: Some(pattern.into()),
        }
    }

    /// All commands passed to `run`, in order.
    pub fn commands(&self) -> Vec<ProcessCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    /// All commands passed to `exec`, in order.
    pub fn execs(&self) -> Vec<ProcessCommand> {
        self.state.lock().unwrap().execs.clone()
    }

    /// Number of `run` invocations.
    pub fn run_count(&self) -> usize {
        self.state.lock().unwrap().commands.len()
    }

    /// The output path a command declares, if any: the token following
    /// `-o`, or the token following `rcs` for archiver commands.
    fn declared_output(cmd: &ProcessCommand) -> Option<PathBuf> {
        if let Some(pos) = cmd.args.iter().position(|a| a == "-o") {
            return cmd.args.get(pos + 1).map(PathBuf::from);
        }
        if cmd.args.first().map(String::as_str) == Some("rcs") {
            return cmd.args.get(1).map(PathBuf::from);
        }
        None
    }

    fn should_fail(&self, cmd: &ProcessCommand) -> bool {
        match &self.fail_pattern {
            Some(pattern) => cmd.display_command().contains(pattern.as_str()),
            None => false,
        }
    }
}

impl Runner for StubRunner {
    fn run(&self, cmd: &ProcessCommand) -> Result<ExecOutput, ProcessError> {
        self.state.lock().unwrap().commands.push(cmd.clone());

        if self.should_fail(cmd) {
            return Ok(ExecOutput {
                exit_code: Some(1),
                signal: None,
                stdout: String::new(),
                stderr: format!("stub failure: {}", cmd.display_command()),
            });
        }

        if let Some(output) = Self::declared_output(cmd) {
            if let Some(parent) = output.parent() {
                if parent != Path::new("") {
                    let _ = std::fs::create_dir_all(parent);
                }
            }
            let _ = std::fs::write(&output, b"");
        }

        Ok(ExecOutput {
            exit_code: Some(0),
            signal: None,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn exec(&self, cmd: &ProcessCommand) -> ProcessError {
        self.state.lock().unwrap().execs.push(cmd.clone());
        ProcessError::NotFound(cmd.program.clone())
    }
}
