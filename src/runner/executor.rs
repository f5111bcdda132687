//! Step executor - runs one step through the command seam

use crate::{
    actions::{
        checkout::{self, CheckoutParams},
        setup_python::{self, SetupPythonParams},
        ActionError, CommandRunner, CommandSpec,
    },
    core::{BuiltinAction, JobContext, Step, StepKind},
    runner::annotations::{parse_findings, Annotation},
};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Default wall-clock bound for one step
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 600;

/// Result of executing a step
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// Step completed successfully
    Success {
        output: String,
        annotations: Vec<Annotation>,
    },
    /// Step exited non-zero or could not be executed
    Failed {
        error: String,
        exit_code: Option<i32>,
        output: String,
        annotations: Vec<Annotation>,
    },
}

impl ExecutionResult {
    /// Whether this result is a success
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Findings attached to the result
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            ExecutionResult::Success { annotations, .. } => annotations,
            ExecutionResult::Failed { annotations, .. } => annotations,
        }
    }
}

/// Executes a single step
pub struct StepExecutor<C> {
    runner: C,
    timeout_secs: u64,
}

impl<C: CommandRunner> StepExecutor<C> {
    pub fn new(runner: C) -> Self {
        Self {
            runner,
            timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(runner: C, timeout_secs: u64) -> Self {
        Self {
            runner,
            timeout_secs,
        }
    }

    /// Execute a step and return the result
    pub async fn execute(&self, step: &Step, ctx: &mut JobContext) -> ExecutionResult {
        info!("Executing step: {}", step.id);

        match &step.kind {
            StepKind::Run { command } => self.execute_run(step, command, ctx).await,
            StepKind::Uses { action, with, .. } => {
                self.execute_uses(step, *action, with, ctx).await
            }
        }
    }

    async fn execute_run(
        &self,
        step: &Step,
        command: &str,
        ctx: &JobContext,
    ) -> ExecutionResult {
        let spec = CommandSpec::shell(command, &ctx.workspace).envs(&ctx.env);
        debug!("Step {} command: {}", step.id, command.trim());

        match self.runner.run(&spec, self.timeout_secs).await {
            Ok(output) => {
                let annotations = parse_findings(&output.stdout);
                let combined = output.combined();

                if output.success() {
                    debug!("Step {} succeeded", step.id);
                    ExecutionResult::Success {
                        output: combined,
                        annotations,
                    }
                } else {
                    warn!("Step {} exited with code {:?}", step.id, output.exit_code);
                    let error = match output.exit_code {
                        Some(code) => format!("Process completed with exit code {}", code),
                        None => "Process was terminated by a signal".to_string(),
                    };
                    ExecutionResult::Failed {
                        error,
                        exit_code: output.exit_code,
                        output: combined,
                        annotations,
                    }
                }
            }
            Err(e) => {
                error!("Command error for step {}: {}", step.id, e);
                ExecutionResult::Failed {
                    error: e.to_string(),
                    exit_code: None,
                    output: String::new(),
                    annotations: Vec::new(),
                }
            }
        }
    }

    async fn execute_uses(
        &self,
        step: &Step,
        action: BuiltinAction,
        with: &HashMap<String, String>,
        ctx: &mut JobContext,
    ) -> ExecutionResult {
        let result = match action {
            BuiltinAction::Checkout => {
                let params = CheckoutParams::from_with(with);
                checkout::run(&self.runner, &params, ctx, self.timeout_secs).await
            }
            BuiltinAction::SetupPython => {
                let params = SetupPythonParams::from_with(with);
                setup_python::run(&self.runner, &params, ctx, self.timeout_secs).await
            }
        };

        match result {
            Ok(output) => ExecutionResult::Success {
                output,
                annotations: Vec::new(),
            },
            Err(ActionError::Tool { message, exit_code }) => {
                error!("Action {} failed for step {}: {}", action.name(), step.id, message);
                ExecutionResult::Failed {
                    error: message,
                    exit_code,
                    output: String::new(),
                    annotations: Vec::new(),
                }
            }
            Err(ActionError::Command(e)) => {
                error!("Command error for step {}: {}", step.id, e);
                ExecutionResult::Failed {
                    error: e.to_string(),
                    exit_code: None,
                    output: String::new(),
                    annotations: Vec::new(),
                }
            }
        }
    }
}
