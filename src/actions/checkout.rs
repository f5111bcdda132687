//! Builtin checkout action - populates the workspace with the source tree

use crate::actions::{ActionError, CommandRunner, CommandSpec};
use crate::core::JobContext;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Parameters accepted by the checkout action
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    /// Source repository to check out; defaults to the invocation directory
    pub source: String,

    /// Optional ref to check out after cloning
    pub reference: Option<String>,
}

impl CheckoutParams {
    /// Build params from a step's `with:` mapping
    pub fn from_with(with: &HashMap<String, String>) -> Self {
        Self {
            source: with.get("path").cloned().unwrap_or_else(|| ".".to_string()),
            reference: with.get("ref").cloned(),
        }
    }
}

/// Check the source tree out into the job workspace
///
/// Fails fatally (aborting the run) if the clone or the ref checkout
/// fails.
pub async fn run(
    runner: &dyn CommandRunner,
    params: &CheckoutParams,
    ctx: &JobContext,
    timeout_secs: u64,
) -> Result<String, ActionError> {
    let source = resolve_source(&params.source)?;
    info!("Checking out {} into {}", source.display(), ctx.workspace.display());

    let clone = CommandSpec::new("git", &ctx.workspace)
        .args(["clone", "--local"])
        .arg(source.display().to_string())
        .arg(".")
        .envs(&ctx.env);

    let output = runner.run(&clone, timeout_secs).await?;
    if !output.success() {
        return Err(ActionError::Tool {
            message: format!("git clone of {} failed: {}", source.display(), output.combined()),
            exit_code: output.exit_code,
        });
    }

    if let Some(reference) = &params.reference {
        let checkout = CommandSpec::new("git", &ctx.workspace)
            .arg("checkout")
            .arg(reference)
            .envs(&ctx.env);

        let output = runner.run(&checkout, timeout_secs).await?;
        if !output.success() {
            return Err(ActionError::Tool {
                message: format!("git checkout of '{}' failed: {}", reference, output.combined()),
                exit_code: output.exit_code,
            });
        }
    }

    Ok(format!("Checked out {}", source.display()))
}

fn resolve_source(source: &str) -> Result<PathBuf, ActionError> {
    let path = PathBuf::from(source);
    if path.is_absolute() {
        return Ok(path);
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| ActionError::Tool {
            message: format!("Cannot resolve checkout source '{}': {}", source, e),
            exit_code: None,
        })
}
