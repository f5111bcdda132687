//! CLI command definitions

use crate::runner::DEFAULT_STEP_TIMEOUT_SECS;
use clap::Args;

/// Run a workflow for a repository event
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Repository event to match against the triggers (kind or kind:activity)
    #[arg(short, long, default_value = "pull_request:opened")]
    pub event: String,

    /// Directory to use as the run workspace (defaults to a scratch dir)
    #[arg(long)]
    pub workspace: Option<String>,

    /// Keep the scratch workspace after the run
    #[arg(long)]
    pub keep_workspace: bool,

    /// Per-step timeout in seconds
    #[arg(long, default_value_t = DEFAULT_STEP_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output a JSON run report
    #[arg(long)]
    pub json: bool,
}

/// Validate a workflow definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
