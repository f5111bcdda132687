//! Real subprocess command runner

use crate::actions::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Spawns commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    /// Execute a command as a child process
    ///
    /// # Errors
    /// Returns `CommandError` if:
    /// - The program cannot be spawned
    /// - The command times out
    /// - The output is not valid UTF-8
    ///
    /// A non-zero exit status is returned as a normal `CommandOutput`.
    async fn run(
        &self,
        spec: &CommandSpec,
        timeout_secs: u64,
    ) -> Result<CommandOutput, CommandError> {
        debug!("Spawning: {}", spec.display_line());

        let timeout_duration = Duration::from_secs(timeout_secs);

        let result = timeout(
            timeout_duration,
            Command::new(&spec.program)
                .args(&spec.args)
                .current_dir(&spec.cwd)
                .envs(&spec.env)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CommandError::Timeout(timeout_secs))?;

        let output =
            result.map_err(|e| CommandError::Spawn(spec.program.clone(), e.to_string()))?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| CommandError::Encoding(e.to_string()))?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|e| CommandError::Encoding(e.to_string()))?;

        let exit_code = output.status.code();
        if !output.status.success() {
            warn!(
                "{} exited with code {:?}: {}",
                spec.program,
                exit_code,
                stderr.trim()
            );
        }

        debug!(
            "{} returned {} bytes of stdout",
            spec.program,
            stdout.len()
        );

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}
