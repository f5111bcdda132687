//! Job context - ambient environment shared by a job's steps

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Recorded result of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step identifier
    pub step_id: String,

    /// Whether the step succeeded
    pub success: bool,

    /// Exit code of the underlying tool, when one ran
    pub exit_code: Option<i32>,

    /// Captured output
    pub output: String,
}

/// Execution context for one job
///
/// Builtin actions mutate `env` and the workspace for every later step in
/// the same job; nothing escapes the run.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// The checked-out tree all steps run in
    pub workspace: PathBuf,

    /// Ambient environment for subsequent steps
    pub env: HashMap<String, String>,

    /// Set once any step in the job fails; condition input
    pub failed: bool,

    /// Outcomes of executed steps, in execution order
    pub outcomes: Vec<StepOutcome>,
}

impl JobContext {
    /// Create a context rooted at the given workspace directory
    pub fn new(workspace: PathBuf) -> Self {
        let mut env = HashMap::new();
        env.insert("CI".to_string(), "true".to_string());

        Self {
            workspace,
            env,
            failed: false,
            outcomes: Vec::new(),
        }
    }

    /// Prepend a directory to the PATH subsequent steps see
    pub fn prepend_path(&mut self, dir: &Path) {
        let current = self
            .env
            .get("PATH")
            .cloned()
            .or_else(|| std::env::var("PATH").ok())
            .unwrap_or_default();

        let path = if current.is_empty() {
            dir.display().to_string()
        } else {
            format!("{}:{}", dir.display(), current)
        };
        self.env.insert("PATH".to_string(), path);
    }

    /// Record the outcome of an executed step
    pub fn record(&mut self, outcome: StepOutcome) {
        if !outcome.success {
            self.failed = true;
        }
        self.outcomes.push(outcome);
    }

    /// Look up the recorded outcome of a step
    pub fn outcome(&self, step_id: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.step_id == step_id)
    }
}
