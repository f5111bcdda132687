//! External tool invocation seam and builtin actions
//!
//! Every process the runner spawns (git, python, pip, the check tools)
//! goes through the [`CommandRunner`] trait, which keeps the engine
//! testable without any of the tools installed.

pub mod checkout;
pub mod setup_python;
pub mod subprocess;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use subprocess::SubprocessRunner;

/// Specification of one external command invocation
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,

    /// Arguments, in order
    pub args: Vec<String>,

    /// Working directory
    pub cwd: PathBuf,

    /// Environment overrides layered on the ambient environment
    pub env: HashMap<String, String>,
}

impl CommandSpec {
    /// Create a spec for a program run in the given directory
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: HashMap::new(),
        }
    }

    /// Create a spec that runs a shell script via `sh -c`
    ///
    /// Multi-line `run:` blocks execute as one script, so an early
    /// failing line still surfaces through the script's exit status.
    pub fn shell(script: &str, cwd: &Path) -> Self {
        Self::new("sh", cwd).arg("-ec").arg(script)
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Layer environment overrides onto the spec
    pub fn envs(mut self, env: &HashMap<String, String>) -> Self {
        for (key, value) in env {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// One-line rendering for logs and test assertions
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured result of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; None when the process was killed by a signal
    pub exit_code: Option<i32>,

    /// Captured stdout
    pub stdout: String,

    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout and stderr joined for display
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Error types for command execution
///
/// A non-zero exit is not an error here; it comes back as a normal
/// [`CommandOutput`] for the executor to classify.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("Failed to spawn {0}: {1}")]
    Spawn(String, String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Output is not valid UTF-8: {0}")]
    Encoding(String),
}

/// Trait for spawning external commands - allows for mock implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, capturing its output
    async fn run(
        &self,
        spec: &CommandSpec,
        timeout_secs: u64,
    ) -> Result<CommandOutput, CommandError>;
}

/// Error from a builtin action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The underlying tool ran but reported failure
    #[error("{message}")]
    Tool {
        message: String,
        exit_code: Option<i32>,
    },
}
